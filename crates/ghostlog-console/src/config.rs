//! Configuration for capturing consoles.
//!
//! `ConsoleConfig` is a partial configuration: every field is optional and
//! [`ConsoleConfig::resolve`] fills the gaps with host defaults. Partial
//! configs can be layered with [`ConsoleConfig::merge`], for example
//! environment settings under programmatic ones.

use std::env;
use std::fmt;
use std::sync::Arc;

use ghostlog_core::format::FormatOptions;
use ghostlog_core::value::ErrorValue;

use crate::detection::{self, parse_flag};
use crate::sink::{ConsoleSink, SinkRef};

/// Called instead of capturing when `error` receives a lone error value.
pub type ErrorHandler = Arc<dyn Fn(&ErrorValue) + Send + Sync>;

/// Partial configuration for a capturing console
#[derive(Clone, Default)]
pub struct ConsoleConfig {
    /// Append formatted output to the instance's buffers (default: true)
    pub record_output: Option<bool>,
    /// Forward every call to the base console (default: false)
    pub real_console_output: Option<bool>,
    /// Cursor-control escapes may be written (default: detected)
    pub supports_ansi: Option<bool>,
    /// Interceptor for `error(err)` calls
    pub error_handler: Option<ErrorHandler>,
    /// Where forwarded calls go (default: the active console's base, or the
    /// real platform console)
    pub base_console: Option<SinkRef>,
    /// Record the extended method surface, not just the core five (default: true)
    pub extended_methods: Option<bool>,
    /// Formatting options for the recorded buffers
    pub format: Option<FormatOptions>,
}

/// A fully resolved configuration.
#[derive(Clone)]
pub struct Settings {
    pub record_output: bool,
    pub real_console_output: bool,
    pub supports_ansi: bool,
    pub error_handler: Option<ErrorHandler>,
    pub base_console: SinkRef,
    pub extended_methods: bool,
    pub format: FormatOptions,
}

impl ConsoleConfig {
    /// Create an empty config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    ///
    /// # Environment Variables
    ///
    /// | Variable | Values | Description |
    /// |----------|--------|-------------|
    /// | `GHOSTLOG_RECORD` | 0/1 | Record output |
    /// | `GHOSTLOG_PASSTHROUGH` | 0/1 | Forward to the real console |
    /// | `GHOSTLOG_ANSI` | 0/1 | Allow cursor-control escapes |
    /// | `GHOSTLOG_DEPTH` | number/none | Inspection depth |
    /// | `NO_COLOR` | (set) | Uncolored buffers (standard) |
    /// | `FORCE_COLOR` | (set) | Colored plain-text buffer |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// [`ConsoleConfig::from_env`] against an explicit environment.
    pub fn from_env_with(var: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| var(name).as_deref().and_then(parse_flag);
        let mut config = Self {
            record_output: flag("GHOSTLOG_RECORD"),
            real_console_output: flag("GHOSTLOG_PASSTHROUGH"),
            supports_ansi: flag("GHOSTLOG_ANSI"),
            ..Self::default()
        };

        let mut inspect = None;
        if let Some(depth) = var("GHOSTLOG_DEPTH") {
            let depth = match depth.trim().to_ascii_lowercase().as_str() {
                "none" | "infinity" | "unlimited" => Some(None),
                other => other.parse::<usize>().ok().map(Some),
            };
            if let Some(depth) = depth {
                inspect = Some(FormatOptions::default().inspect.with_depth(depth));
            }
        }
        let colors = if var("NO_COLOR").is_some() {
            Some(false)
        } else if var("FORCE_COLOR").is_some_and(|v| v.trim() != "0") {
            Some(true)
        } else {
            None
        };
        if let Some(colors) = colors {
            inspect = Some(inspect.unwrap_or_default().with_colors(colors));
        }
        if let Some(inspect) = inspect {
            config.format = Some(FormatOptions::default().with_inspect(inspect));
        }

        config
    }

    // ─────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────

    /// Record output into the buffers
    #[must_use]
    pub fn with_record_output(mut self, record: bool) -> Self {
        self.record_output = Some(record);
        self
    }

    /// Forward calls to the base console
    #[must_use]
    pub fn with_real_console_output(mut self, forward: bool) -> Self {
        self.real_console_output = Some(forward);
        self
    }

    /// Override ANSI support detection
    #[must_use]
    pub fn with_supports_ansi(mut self, supported: bool) -> Self {
        self.supports_ansi = Some(supported);
        self
    }

    /// Intercept lone error values passed to `error`
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ErrorValue) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Set the console forwarded calls go to
    #[must_use]
    pub fn with_base_console(mut self, base: Arc<dyn ConsoleSink>) -> Self {
        self.base_console = Some(base);
        self
    }

    /// Record only the core methods when `false`
    #[must_use]
    pub fn with_extended_methods(mut self, extended: bool) -> Self {
        self.extended_methods = Some(extended);
        self
    }

    /// Set formatting options for the buffers
    #[must_use]
    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = Some(format);
        self
    }

    /// Layers `other` over `self`: fields set in `other` win.
    #[must_use]
    pub fn merge(self, other: ConsoleConfig) -> Self {
        Self {
            record_output: other.record_output.or(self.record_output),
            real_console_output: other.real_console_output.or(self.real_console_output),
            supports_ansi: other.supports_ansi.or(self.supports_ansi),
            error_handler: other.error_handler.or(self.error_handler),
            base_console: other.base_console.or(self.base_console),
            extended_methods: other.extended_methods.or(self.extended_methods),
            format: other.format.or(self.format),
        }
    }

    /// Fills unset fields with host defaults.
    ///
    /// The default base console is the base of whichever console is active
    /// for the caller, which is the real platform console unless something
    /// else was installed.
    #[must_use]
    pub fn resolve(self) -> Settings {
        Settings {
            record_output: self.record_output.unwrap_or(true),
            real_console_output: self.real_console_output.unwrap_or(false),
            supports_ansi: self.supports_ansi.unwrap_or_else(detection::supports_ansi),
            error_handler: self.error_handler,
            base_console: self
                .base_console
                .unwrap_or_else(|| crate::router::active().base()),
            extended_methods: self.extended_methods.unwrap_or(true),
            format: self.format.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("record_output", &self.record_output)
            .field("real_console_output", &self.real_console_output)
            .field("supports_ansi", &self.supports_ansi)
            .field("error_handler", &self.error_handler.is_some())
            .field("base_console", &self.base_console.is_some())
            .field("extended_methods", &self.extended_methods)
            .field("format", &self.format)
            .finish()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("record_output", &self.record_output)
            .field("real_console_output", &self.real_console_output)
            .field("supports_ansi", &self.supports_ansi)
            .field("error_handler", &self.error_handler.is_some())
            .field("extended_methods", &self.extended_methods)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_empty() {
        let config = ConsoleConfig::default();
        assert!(config.record_output.is_none());
        assert!(config.real_console_output.is_none());
        assert!(config.base_console.is_none());
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = ConsoleConfig::new()
            .with_base_console(Arc::new(RecordingSink::new()))
            .with_supports_ansi(false)
            .resolve();
        assert!(settings.record_output);
        assert!(!settings.real_console_output);
        assert!(!settings.supports_ansi);
        assert!(settings.extended_methods);
        assert!(settings.error_handler.is_none());
        assert_eq!(settings.format, FormatOptions::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = ConsoleConfig::new()
            .with_record_output(false)
            .with_real_console_output(true)
            .with_extended_methods(false)
            .with_error_handler(|_| {});
        assert_eq!(config.record_output, Some(false));
        assert_eq!(config.real_console_output, Some(true));
        assert_eq!(config.extended_methods, Some(false));
        assert!(config.error_handler.is_some());
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = ConsoleConfig::new()
            .with_record_output(false)
            .with_supports_ansi(true);
        let merged = base.merge(ConsoleConfig::new().with_record_output(true));
        assert_eq!(merged.record_output, Some(true));
        assert_eq!(merged.supports_ansi, Some(true));
    }

    #[test]
    fn test_from_env_flags() {
        let config = ConsoleConfig::from_env_with(env_of(&[
            ("GHOSTLOG_RECORD", "0"),
            ("GHOSTLOG_PASSTHROUGH", "yes"),
            ("GHOSTLOG_ANSI", "garbage"),
        ]));
        assert_eq!(config.record_output, Some(false));
        assert_eq!(config.real_console_output, Some(true));
        assert_eq!(config.supports_ansi, None);
        assert!(config.format.is_none());
    }

    #[test]
    fn test_from_env_depth_and_colors() {
        let config = ConsoleConfig::from_env_with(env_of(&[
            ("GHOSTLOG_DEPTH", "none"),
            ("FORCE_COLOR", "1"),
        ]));
        let inspect = config.format.map(|f| f.inspect).unwrap_or_default();
        assert_eq!(inspect.depth, None);
        assert!(inspect.colors);

        let config = ConsoleConfig::from_env_with(env_of(&[
            ("GHOSTLOG_DEPTH", "4"),
            ("NO_COLOR", ""),
            ("FORCE_COLOR", "1"),
        ]));
        let inspect = config.format.map(|f| f.inspect).unwrap_or_default();
        assert_eq!(inspect.depth, Some(4));
        assert!(!inspect.colors);
    }

    #[test]
    fn test_debug_hides_handler() {
        let config = ConsoleConfig::new().with_error_handler(|_| {});
        let debug = format!("{config:?}");
        assert!(debug.contains("error_handler: true"));
    }
}
