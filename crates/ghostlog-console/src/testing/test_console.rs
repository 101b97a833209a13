//! TestConsole for capturing output in tests
//!
//! Wraps a capturing console whose base is a [`RecordingSink`], so nothing
//! reaches the real terminal, and adds assertions over what was captured.

use std::sync::Arc;

use ghostlog_core::format::FormatOptions;
use ghostlog_core::inspect::InspectOptions;
use strip_ansi_escapes::strip_str;

use crate::config::ConsoleConfig;
use crate::console::{CaptureConsole, ConsoleRef};

use super::RecordingSink;

/// A capturing console with assertion helpers
///
/// Use `console()` to get the inner console (to log through it directly or
/// to `run` code with it active), then use `output()`, `contains()`, and
/// the assertion methods to verify what was captured.
#[derive(Clone)]
pub struct TestConsole {
    inner: ConsoleRef,
    sink: Arc<RecordingSink>,
}

impl TestConsole {
    /// Create a test console with an uncolored text buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::new())
    }

    /// Create a test console whose text buffer keeps ANSI colors
    #[must_use]
    pub fn new_colored() -> Self {
        Self::with_config(
            ConsoleConfig::new().with_format(
                FormatOptions::default().with_inspect(InspectOptions::default().with_colors(true)),
            ),
        )
    }

    /// Create a test console from a config; the base console is always
    /// replaced by a recording sink
    #[must_use]
    pub fn with_config(config: ConsoleConfig) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let inner = CaptureConsole::new(
            ConsoleConfig::new()
                .with_supports_ansi(false)
                .merge(config)
                .with_base_console(sink.clone()),
        );
        Self { inner, sink }
    }

    /// Get the underlying console
    #[must_use]
    pub fn console(&self) -> &ConsoleRef {
        &self.inner
    }

    /// The sink that receives forwarded calls
    #[must_use]
    pub fn sink(&self) -> &Arc<RecordingSink> {
        &self.sink
    }

    /// Get all captured lines (ANSI codes stripped)
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        strip_str(self.inner.outputs())
            .lines()
            .map(String::from)
            .collect()
    }

    /// Get all captured lines (with ANSI codes)
    #[must_use]
    pub fn raw_output(&self) -> Vec<String> {
        self.inner.outputs().lines().map(String::from).collect()
    }

    /// Get output as a single string
    #[must_use]
    pub fn output_string(&self) -> String {
        self.output().join("\n")
    }

    /// Captured HTML
    #[cfg(feature = "html")]
    #[must_use]
    pub fn html(&self) -> String {
        self.inner.outputs_html()
    }

    /// Check if output contains a string (case-insensitive)
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        let output = self.output_string().to_lowercase();
        output.contains(&needle.to_lowercase())
    }

    /// Check if output contains all of the given strings
    #[must_use]
    pub fn contains_all(&self, needles: &[&str]) -> bool {
        needles.iter().all(|n| self.contains(n))
    }

    /// Check if output matches a regex pattern
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(&self.output_string()),
            Err(_) => false,
        }
    }

    /// Assert that output contains a string
    ///
    /// # Panics
    ///
    /// Panics if the output does not contain the needle string.
    pub fn assert_contains(&self, needle: &str) {
        assert!(
            self.contains(needle),
            "Output did not contain '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// Assert that output does NOT contain a string
    ///
    /// # Panics
    ///
    /// Panics if the output contains the needle string.
    pub fn assert_not_contains(&self, needle: &str) {
        assert!(
            !self.contains(needle),
            "Output unexpectedly contained '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// Assert output has specific number of lines
    ///
    /// # Panics
    ///
    /// Panics if the line count doesn't match expected.
    pub fn assert_line_count(&self, expected: usize) {
        let actual = self.output().len();
        assert_eq!(
            actual, expected,
            "Expected {} lines but got {}. Actual output:\n{}",
            expected, actual, self.output_string()
        );
    }

    /// Clear the captured output
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Print output for debugging (in tests)
    pub fn debug_print(&self) {
        eprintln!("=== TestConsole Output ===");
        for (i, line) in self.output().iter().enumerate() {
            eprintln!("{:3}: {}", i + 1, line);
        }
        eprintln!("==========================");
    }
}

impl Default for TestConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestConsole")
            .field("line_count", &self.output().len())
            .field("forwarded", &self.sink.calls().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostlog_core::value::Object;

    #[test]
    fn test_output_capture() {
        let tc = TestConsole::new();
        tc.console().log(&["Hello, world!".into()]);
        assert!(tc.contains("Hello"));
        assert!(tc.contains("world"));
    }

    #[test]
    fn test_contains_case_insensitive() {
        let tc = TestConsole::new();
        tc.console().log(&["Hello World".into()]);
        assert!(tc.contains("hello"));
        assert!(tc.contains("WORLD"));
    }

    #[test]
    fn test_contains_all() {
        let tc = TestConsole::new();
        tc.console().log(&["The quick brown fox".into()]);
        assert!(tc.contains_all(&["quick", "brown", "fox"]));
        assert!(!tc.contains_all(&["quick", "lazy"]));
    }

    #[test]
    fn test_assert_not_contains() {
        let tc = TestConsole::new();
        tc.console().log(&["Success".into()]);
        tc.assert_not_contains("Error");
    }

    #[test]
    fn test_clear() {
        let tc = TestConsole::new();
        tc.console().log(&["Some output".into()]);
        assert!(!tc.output().is_empty());
        tc.clear();
        assert!(tc.output().is_empty());
    }

    #[test]
    fn test_line_count_splits_multiline_logs() {
        let tc = TestConsole::new();
        tc.console().log(&["Line 1".into()]);
        tc.console().log(&["Line 2\nLine 3".into()]);
        tc.assert_line_count(3);
    }

    #[test]
    fn test_matches_regex() {
        let tc = TestConsole::new();
        tc.console().log(&["Error code: %d".into(), 42.into()]);
        assert!(tc.matches(r"code: \d+"));
        assert!(!tc.matches(r"code: [a-z]+"));
        assert!(!tc.matches(r"("));
    }

    #[test]
    fn test_colored_output_is_stripped() {
        let tc = TestConsole::new_colored();
        tc.console().log(&[Object::from_entries([("n", 1)]).into()]);
        assert!(tc.raw_output()[0].contains('\x1b'));
        assert_eq!(tc.output(), vec!["{ n: 1 }".to_string()]);
    }

    #[test]
    fn test_forwarding_goes_to_sink() {
        let tc = TestConsole::with_config(ConsoleConfig::new().with_real_console_output(true));
        tc.console().info(&["fwd".into()]);
        assert_eq!(tc.sink().calls().len(), 1);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let tc = TestConsole::new();
        tc.console().log(&["Test".into()]);
        let tc2 = tc.clone();
        assert!(tc2.contains("Test"));
    }
}
