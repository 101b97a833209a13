//! Cursor-control sequences written by overwritable lines.

/// Moves the cursor up one row.
pub const CURSOR_UP: &str = "\x1b[1A";

/// Erases the current row and returns the cursor to column zero.
pub const ERASE_LINE: &str = "\x1b[2K\r";

/// Clears the screen and scrollback, then homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[3J\x1b[H";

/// Sequence that erases the last `rows` rows, leaving the cursor at the start
/// of the topmost one.
#[must_use]
pub fn erase_rows(rows: usize) -> String {
    let mut out = String::with_capacity(rows * (CURSOR_UP.len() + ERASE_LINE.len()));
    for _ in 0..rows {
        out.push_str(CURSOR_UP);
        out.push_str(ERASE_LINE);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_rows() {
        assert_eq!(erase_rows(0), "");
        assert_eq!(erase_rows(1), "\x1b[1A\x1b[2K\r");
        assert_eq!(erase_rows(2).matches(CURSOR_UP).count(), 2);
    }
}
