//! `log` records routed to the active capturing console.
//!
//! # Usage
//!
//! ```ignore
//! use ghostlog_console::logging::CaptureLogger;
//! use log::Level;
//!
//! // Simple initialization
//! CaptureLogger::init(Level::Info)?;
//!
//! // Or use the builder for more control
//! CaptureLogger::builder()
//!     .level(Level::Debug)
//!     .with_timestamps(false)
//!     .with_targets(true)
//!     .init()?;
//! ```

use log::{Level, LevelFilter, Log, Metadata, Record};

use ghostlog_core::logging::is_internal;

use super::LogEvent;

/// Logger that writes every record to the active console.
///
/// Errors go to `error`, warnings to `warn`, info to `info`, and debug and
/// trace to `debug`.
#[derive(Debug)]
pub struct CaptureLogger {
    min_level: Level,
    show_timestamps: bool,
    show_targets: bool,
}

impl CaptureLogger {
    /// Create a new logger with the given minimum level.
    #[must_use]
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            show_timestamps: true,
            show_targets: true,
        }
    }

    /// Create a logger using the builder pattern.
    #[must_use]
    pub fn builder() -> CaptureLoggerBuilder {
        CaptureLoggerBuilder::new()
    }

    /// Initialize as the global logger.
    ///
    /// Returns an error if a logger has already been set.
    pub fn init(min_level: Level) -> Result<(), log::SetLoggerError> {
        Self::builder().level(min_level).init()
    }

    fn record_to_event(&self, record: &Record) -> LogEvent {
        let event = LogEvent::new(record.level(), record.target(), record.args().to_string());
        if self.show_timestamps {
            event.stamped()
        } else {
            event
        }
    }
}

/// Builder for configuring the capture logger.
#[derive(Debug)]
pub struct CaptureLoggerBuilder {
    min_level: Level,
    show_timestamps: bool,
    show_targets: bool,
}

impl Default for CaptureLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureLoggerBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Level::Info,
            show_timestamps: true,
            show_targets: true,
        }
    }

    /// Set the minimum log level.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Set the minimum log level from a LevelFilter.
    #[must_use]
    pub fn level_filter(mut self, filter: LevelFilter) -> Self {
        self.min_level = filter.to_level().unwrap_or(Level::Trace);
        self
    }

    /// Set whether to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    /// Set whether to show target/module paths.
    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    /// Build the logger without installing it.
    #[must_use]
    pub fn build(self) -> CaptureLogger {
        CaptureLogger {
            min_level: self.min_level,
            show_timestamps: self.show_timestamps,
            show_targets: self.show_targets,
        }
    }

    /// Build and install as the global logger.
    ///
    /// Returns an error if a logger has already been set.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.min_level;
        log::set_boxed_logger(Box::new(self.build()))?;
        log::set_max_level(level.to_level_filter());
        Ok(())
    }

    /// Build and install, ignoring errors if already set.
    pub fn try_init(self) {
        let _ = self.init();
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.min_level && !is_internal(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.record_to_event(record).emit(self.show_targets);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use crate::console::CaptureConsole;
    use crate::testing::RecordingSink;
    use std::sync::Arc;

    fn metadata(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_enabled_by_level() {
        let logger = CaptureLogger::new(Level::Info);
        assert!(logger.enabled(&metadata(Level::Error, "app")));
        assert!(logger.enabled(&metadata(Level::Info, "app")));
        assert!(!logger.enabled(&metadata(Level::Debug, "app")));
    }

    #[test]
    fn test_internal_targets_skipped() {
        let logger = CaptureLogger::new(Level::Trace);
        assert!(!logger.enabled(&metadata(Level::Error, "ghostlog::router")));
        assert!(!logger.enabled(&metadata(Level::Error, "ghostlog_console::console")));
        assert!(logger.enabled(&metadata(Level::Error, "ghostlogger")));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = CaptureLoggerBuilder::default();
        assert_eq!(builder.min_level, Level::Info);
        assert!(builder.show_timestamps);
        assert!(builder.show_targets);
    }

    #[test]
    fn test_builder_level_filter() {
        let builder = CaptureLogger::builder().level_filter(LevelFilter::Warn);
        assert_eq!(builder.min_level, Level::Warn);
        let builder = CaptureLogger::builder().level_filter(LevelFilter::Off);
        assert_eq!(builder.min_level, Level::Trace);
    }

    #[test]
    fn test_records_reach_active_console() {
        let sink = Arc::new(RecordingSink::new());
        let capture = CaptureConsole::new(
            ConsoleConfig::new()
                .with_base_console(sink)
                .with_supports_ansi(false),
        );
        let logger = CaptureLogger::builder()
            .level(Level::Debug)
            .with_timestamps(false)
            .build();

        let result = capture.run(|| {
            logger.log(
                &Record::builder()
                    .level(Level::Warn)
                    .target("app")
                    .args(format_args!("100% done"))
                    .build(),
            );
            logger.log(
                &Record::builder()
                    .level(Level::Trace)
                    .target("app")
                    .args(format_args!("too chatty"))
                    .build(),
            );
        });
        assert!(result.is_ok());
        assert_eq!(capture.outputs(), "WARN app: 100% done\n");
    }
}
