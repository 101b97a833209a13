//! The global console facade.
//!
//! This is the only place with process-wide console state: the default
//! console, the `console_*!` macros that resolve the active console on every
//! call, and an extension record for extra fields that hosts want to hang
//! off the facade.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use ghostlog_core::value::Value;
use ghostlog_core::{Error, Result};

use crate::config::ConsoleConfig;
use crate::console::{CaptureConsole, ConsoleRef};
use crate::detection;
use crate::method::Method;
use crate::router;
use crate::sink::StdConsole;

/// The process-wide fallback console: records nothing and forwards
/// everything to the real platform console.
#[must_use]
pub fn default_console() -> ConsoleRef {
    static DEFAULT: OnceLock<ConsoleRef> = OnceLock::new();
    DEFAULT
        .get_or_init(|| {
            CaptureConsole::new(
                ConsoleConfig::new()
                    .with_record_output(false)
                    .with_real_console_output(true)
                    .with_supports_ansi(detection::supports_ansi())
                    .with_base_console(StdConsole::shared()),
            )
        })
        .clone()
}

/// The console calls reach right now.
#[must_use]
pub fn console() -> ConsoleRef {
    router::active()
}

/// Logs through the active console.
///
/// ```ignore
/// console_log!("Hello, %s!", "World");
/// ```
#[macro_export]
macro_rules! console_log {
    ($($arg:expr),* $(,)?) => {
        $crate::global::console().log(&[$($crate::Value::from($arg)),*])
    };
}

/// `info` through the active console.
#[macro_export]
macro_rules! console_info {
    ($($arg:expr),* $(,)?) => {
        $crate::global::console().info(&[$($crate::Value::from($arg)),*])
    };
}

/// `warn` through the active console.
#[macro_export]
macro_rules! console_warn {
    ($($arg:expr),* $(,)?) => {
        $crate::global::console().warn(&[$($crate::Value::from($arg)),*])
    };
}

/// `debug` through the active console.
#[macro_export]
macro_rules! console_debug {
    ($($arg:expr),* $(,)?) => {
        $crate::global::console().debug(&[$($crate::Value::from($arg)),*])
    };
}

/// `error` through the active console.
#[macro_export]
macro_rules! console_error {
    ($($arg:expr),* $(,)?) => {
        $crate::global::console().error(&[$($crate::Value::from($arg)),*])
    };
}

// ─────────────────────────────────────────────────────────
// Extensions
// ─────────────────────────────────────────────────────────

/// Facade and router names that extensions may not shadow.
const RESERVED: &[&str] = &[
    "freshLine",
    "fresh_line",
    "clear",
    "outputs",
    "outputsHtml",
    "outputs_html",
    "hookAsyncContext",
    "activate",
    "run",
    "run_async",
    "setStrategy",
    "set_strategy",
    "strategy",
    "reset_strategy",
    "active",
    "set_active",
    "run_scoped",
];

static EXTENSIONS: LazyLock<RwLock<HashMap<String, Value>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Whether `name` collides with a console method or router operation.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name.parse::<Method>().is_ok() || RESERVED.contains(&name)
}

/// Attaches `value` to the facade under `name`, returning the previous value.
pub fn set_extension(name: &str, value: impl Into<Value>) -> Result<Option<Value>> {
    if is_reserved(name) {
        return Err(Error::ReservedExtension(name.to_string()));
    }
    Ok(EXTENSIONS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.to_string(), value.into()))
}

/// Reads an extension.
#[must_use]
pub fn extension(name: &str) -> Option<Value> {
    EXTENSIONS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// Removes an extension, returning its value.
pub fn remove_extension(name: &str) -> Option<Value> {
    EXTENSIONS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(name)
}

/// Names of every extension, sorted.
#[must_use]
pub fn extension_names() -> Vec<String> {
    let mut names: Vec<String> = EXTENSIONS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_console_shape() {
        let console = default_console();
        assert!(!console.records_output());
        assert!(console.forwards_output());
        assert!(Arc::ptr_eq(&console, &default_console()));
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("log"));
        assert!(is_reserved("groupCollapsed"));
        assert!(is_reserved("freshLine"));
        assert!(is_reserved("run_scoped"));
        assert!(!is_reserved("version"));
    }

    #[test]
    fn test_extension_lifecycle() {
        assert!(matches!(
            set_extension("warn", 1),
            Err(Error::ReservedExtension(name)) if name == "warn"
        ));

        assert!(matches!(set_extension("global_test_ext", "v1"), Ok(None)));
        assert!(matches!(set_extension("global_test_ext", "v2"), Ok(Some(_))));
        assert_eq!(
            extension("global_test_ext").as_ref().and_then(Value::as_str),
            Some("v2")
        );
        assert!(extension_names().contains(&"global_test_ext".to_string()));
        assert!(remove_extension("global_test_ext").is_some());
        assert!(extension("global_test_ext").is_none());
    }
}
