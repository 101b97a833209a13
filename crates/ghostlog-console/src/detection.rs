//! Terminal capability detection
//!
//! Decides whether cursor-control escapes may be written and how many colors
//! the real console can show, based on the environment and whether stdout
//! is a terminal.

use std::env;

/// Color capability of an output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ColorDepth {
    /// No color support
    #[default]
    None,
    /// 16 colors
    Ansi16,
    /// 256 colors
    Ansi256,
    /// 24-bit color
    TrueColor,
}

impl ColorDepth {
    /// Whether any color is supported
    #[must_use]
    pub fn has_color(self) -> bool {
        self != Self::None
    }
}

/// Parses a boolean-ish environment value (`1/true/yes/on`, `0/false/no/off`).
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads a boolean environment variable.
#[must_use]
pub fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().as_deref().and_then(parse_flag)
}

/// Determine if cursor-control escapes are supported on stdout
#[must_use]
pub fn supports_ansi() -> bool {
    supports_ansi_with(console::Term::stdout().is_term(), |key| env::var(key).ok())
}

/// [`supports_ansi`] against an explicit environment.
pub fn supports_ansi_with(is_terminal: bool, var: impl Fn(&str) -> Option<String>) -> bool {
    // Explicit override always wins
    if let Some(flag) = var("GHOSTLOG_ANSI").as_deref().and_then(parse_flag) {
        return flag;
    }
    if var("TERM").is_some_and(|term| term == "dumb") {
        return false;
    }
    is_terminal
}

/// Detect the color depth of a destination
#[must_use]
pub fn detect_color_depth(is_terminal: bool) -> ColorDepth {
    detect_color_depth_with(is_terminal, |key| env::var(key).ok())
}

/// [`detect_color_depth`] against an explicit environment.
pub fn detect_color_depth_with(
    is_terminal: bool,
    var: impl Fn(&str) -> Option<String>,
) -> ColorDepth {
    if var("NO_COLOR").is_some() {
        return ColorDepth::None;
    }
    if let Some(level) = var("FORCE_COLOR") {
        return match level.trim() {
            "0" | "false" => ColorDepth::None,
            "2" => ColorDepth::Ansi256,
            "3" => ColorDepth::TrueColor,
            _ => ColorDepth::Ansi16,
        };
    }
    if !is_terminal {
        return ColorDepth::None;
    }
    let term = var("TERM").unwrap_or_default();
    if term == "dumb" {
        return ColorDepth::None;
    }
    if var("COLORTERM").is_some_and(|v| v == "truecolor" || v == "24bit") {
        return ColorDepth::TrueColor;
    }
    if term.contains("256color") {
        return ColorDepth::Ansi256;
    }
    ColorDepth::Ansi16
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_ansi_override_wins() {
        assert!(supports_ansi_with(false, env_of(&[("GHOSTLOG_ANSI", "1")])));
        assert!(!supports_ansi_with(true, env_of(&[("GHOSTLOG_ANSI", "0")])));
    }

    #[test]
    fn test_ansi_dumb_terminal() {
        assert!(!supports_ansi_with(true, env_of(&[("TERM", "dumb")])));
        assert!(supports_ansi_with(true, env_of(&[("TERM", "xterm")])));
        assert!(!supports_ansi_with(false, env_of(&[])));
    }

    #[test]
    fn test_no_color_disables() {
        let depth = detect_color_depth_with(true, env_of(&[("NO_COLOR", ""), ("COLORTERM", "truecolor")]));
        assert_eq!(depth, ColorDepth::None);
        assert!(!depth.has_color());
    }

    #[test]
    fn test_force_color_levels() {
        assert_eq!(detect_color_depth_with(false, env_of(&[("FORCE_COLOR", "")])), ColorDepth::Ansi16);
        assert_eq!(detect_color_depth_with(false, env_of(&[("FORCE_COLOR", "3")])), ColorDepth::TrueColor);
        assert_eq!(detect_color_depth_with(true, env_of(&[("FORCE_COLOR", "0")])), ColorDepth::None);
    }

    #[test]
    fn test_terminal_depths() {
        assert_eq!(detect_color_depth_with(false, env_of(&[])), ColorDepth::None);
        assert_eq!(
            detect_color_depth_with(true, env_of(&[("TERM", "xterm-256color")])),
            ColorDepth::Ansi256
        );
        assert_eq!(
            detect_color_depth_with(true, env_of(&[("COLORTERM", "24bit")])),
            ColorDepth::TrueColor
        );
        assert_eq!(detect_color_depth_with(true, env_of(&[("TERM", "xterm")])), ColorDepth::Ansi16);
    }

    #[test]
    fn test_color_depth_ordering() {
        assert!(ColorDepth::TrueColor > ColorDepth::Ansi256);
        assert_eq!(ColorDepth::default(), ColorDepth::None);
    }
}
