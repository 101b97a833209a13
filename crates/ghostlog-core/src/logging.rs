//! Internal diagnostics for ghostlog.
//!
//! ghostlog reports its own behavior through the standard [`log`] facade and
//! never installs a logger. Records use the hierarchical targets below so
//! they can be filtered, and so the capture bridges can recognize (and skip)
//! them.
//!
//! Example filter: `RUST_LOG=ghostlog::router=debug,ghostlog::stream=trace`

// Re-export log macros for ergonomic use
pub use log::{debug, error, info, trace, warn};

// Re-export log level types for programmatic use
pub use log::{Level, LevelFilter};

/// Log targets used by ghostlog components.
pub mod targets {
    /// Root target for all ghostlog logs.
    pub const GHOSTLOG: &str = "ghostlog";

    /// Context routing: strategy changes, scope entry and exit.
    pub const ROUTER: &str = "ghostlog::router";

    /// Capturing console lifecycle and interception.
    pub const CONSOLE: &str = "ghostlog::console";

    /// Output streams and resize subscriptions.
    pub const STREAM: &str = "ghostlog::stream";

    /// Argument formatting fallbacks.
    pub const FORMAT: &str = "ghostlog::format";
}

/// Returns whether `target` belongs to ghostlog itself.
#[inline]
#[must_use]
pub fn is_internal(target: &str) -> bool {
    target == targets::GHOSTLOG || target.starts_with("ghostlog::") || target.starts_with("ghostlog_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_targets_are_hierarchical() {
        assert!(targets::ROUTER.starts_with(targets::GHOSTLOG));
        assert!(targets::CONSOLE.starts_with(targets::GHOSTLOG));
        assert!(targets::STREAM.starts_with(targets::GHOSTLOG));
        assert!(targets::FORMAT.starts_with(targets::GHOSTLOG));
    }

    #[test]
    fn internal_targets_are_recognized() {
        assert!(is_internal(targets::ROUTER));
        assert!(is_internal("ghostlog_console::router"));
        assert!(!is_internal("ghostlogger"));
        assert!(!is_internal("my_app"));
    }
}
