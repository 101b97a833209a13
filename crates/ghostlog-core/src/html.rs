//! HTML escaping and ANSI-to-HTML conversion.
//!
//! Every piece of caller-supplied text that reaches the HTML transcript goes
//! through [`ansi_to_html`] (text content) or [`escape_attr`] (style
//! attributes). The only markup in the output is markup generated here.

use std::fmt::Write as _;

/// Escapes text content for safe embedding in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut result, c);
    }
    result
}

/// Escapes a value destined for a double-quoted attribute.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '&' => out.push_str("&amp;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

/// Converts literal newlines into a line-break tag followed by the newline.
#[must_use]
pub fn newlines_to_breaks(html: &str) -> String {
    html.replace('\n', "<br>\n")
}

// ─────────────────────────────────────────────────────────
// SGR state
// ─────────────────────────────────────────────────────────

const PALETTE: [&str; 16] = [
    "#000000", "#cd3131", "#0dbc79", "#e5e510", "#2472c8", "#bc3fbc", "#11a8cd", "#e5e5e5",
    "#666666", "#f14c4c", "#23d18b", "#f5f543", "#3b8eea", "#d670d6", "#29b8db", "#ffffff",
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SgrState {
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    fg: Option<String>,
    bg: Option<String>,
}

impl SgrState {
    fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    fn css(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(fg) = &self.fg {
            parts.push(format!("color:{fg}"));
        }
        if let Some(bg) = &self.bg {
            parts.push(format!("background-color:{bg}"));
        }
        if self.bold {
            parts.push("font-weight:bold".to_string());
        }
        if self.dim {
            parts.push("opacity:0.7".to_string());
        }
        if self.italic {
            parts.push("font-style:italic".to_string());
        }
        match (self.underline, self.strike) {
            (true, true) => parts.push("text-decoration:underline line-through".to_string()),
            (true, false) => parts.push("text-decoration:underline".to_string()),
            (false, true) => parts.push("text-decoration:line-through".to_string()),
            (false, false) => {}
        }
        parts.join(";")
    }

    fn apply(&mut self, params: &str) {
        let codes: Vec<u16> = if params.is_empty() {
            vec![0]
        } else {
            params
                .split(';')
                .map(|p| p.parse::<u16>().unwrap_or(0))
                .collect()
        };

        let mut iter = codes.into_iter();
        while let Some(code) = iter.next() {
            match code {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                9 => self.strike = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                29 => self.strike = false,
                30..=37 => self.fg = Some(PALETTE[usize::from(code - 30)].to_string()),
                90..=97 => self.fg = Some(PALETTE[usize::from(code - 90 + 8)].to_string()),
                40..=47 => self.bg = Some(PALETTE[usize::from(code - 40)].to_string()),
                100..=107 => self.bg = Some(PALETTE[usize::from(code - 100 + 8)].to_string()),
                39 => self.fg = None,
                49 => self.bg = None,
                38 | 48 => {
                    let color = extended_color(&mut iter);
                    if code == 38 {
                        self.fg = color;
                    } else {
                        self.bg = color;
                    }
                }
                _ => {}
            }
        }
    }
}

fn extended_color(iter: &mut impl Iterator<Item = u16>) -> Option<String> {
    match iter.next()? {
        5 => Some(indexed_color(iter.next()?)),
        2 => {
            let r = iter.next()?.min(255);
            let g = iter.next()?.min(255);
            let b = iter.next()?.min(255);
            Some(format!("#{r:02x}{g:02x}{b:02x}"))
        }
        _ => None,
    }
}

fn indexed_color(index: u16) -> String {
    match index {
        0..=15 => PALETTE[usize::from(index)].to_string(),
        16..=231 => {
            let i = index - 16;
            let r = CUBE_LEVELS[usize::from(i / 36)];
            let g = CUBE_LEVELS[usize::from((i / 6) % 6)];
            let b = CUBE_LEVELS[usize::from(i % 6)];
            format!("#{r:02x}{g:02x}{b:02x}")
        }
        _ => {
            let level = 8 + 10 * (index.min(255) - 232);
            format!("#{level:02x}{level:02x}{level:02x}")
        }
    }
}

// ─────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────

/// Escapes `text` for HTML and turns SGR color sequences into inline spans.
///
/// Non-SGR CSI sequences, OSC sequences and other escapes are dropped. Spans
/// are opened lazily, so a style change with no text after it produces no
/// markup.
#[must_use]
pub fn ansi_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut current = SgrState::default();
    let mut open: Option<SgrState> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            let wanted = (!current.is_plain()).then(|| current.clone());
            if open != wanted {
                if open.is_some() {
                    out.push_str("</span>");
                }
                if let Some(state) = &wanted {
                    let _ = write!(out, "<span style=\"{}\">", escape_attr(&state.css()));
                }
                open = wanted;
            }
            push_escaped(&mut out, c);
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                let mut params = String::new();
                let mut terminator = None;
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        terminator = Some(c);
                        break;
                    }
                    params.push(c);
                }
                if terminator == Some('m') {
                    current.apply(&params);
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }

    if open.is_some() {
        out.push_str("</span>");
    }
    out
}
