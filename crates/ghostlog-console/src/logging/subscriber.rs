//! Tracing subscriber integration.
//!
//! Provides a tracing `Layer` and builder that route events to the active
//! capturing console.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use ghostlog_core::logging::is_internal;

use super::LogEvent;

/// A tracing layer that writes events to the active console.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    include_timestamps: bool,
    include_targets: bool,
}

impl CaptureLayer {
    /// Create a new capture layer.
    #[must_use]
    pub fn new(include_timestamps: bool, include_targets: bool) -> Self {
        Self {
            include_timestamps,
            include_targets,
        }
    }
}

impl Default for CaptureLayer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            if self.message.is_none() {
                self.message = Some(value);
            }
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }
}

fn level_of(level: tracing::Level) -> log::Level {
    match level {
        tracing::Level::ERROR => log::Level::Error,
        tracing::Level::WARN => log::Level::Warn,
        tracing::Level::INFO => log::Level::Info,
        tracing::Level::DEBUG => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<String> = scope.from_root().map(|span| span.name().to_string()).collect();
            if !spans.is_empty() {
                collector
                    .fields
                    .push(("span".to_string(), spans.join("::")));
            }
        }

        let message = collector
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let mut log_event = LogEvent::new(level_of(*metadata.level()), metadata.target(), message);
        if self.include_timestamps {
            log_event = log_event.stamped();
        }
        for (key, value) in collector.fields {
            log_event = log_event.with_field(key, value);
        }

        log_event.emit(self.include_targets);
    }
}

/// Builder for configuring a capturing tracing subscriber.
#[derive(Debug)]
pub struct CaptureSubscriberBuilder {
    show_timestamps: bool,
    show_targets: bool,
    level_filter: LevelFilter,
}

impl Default for CaptureSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSubscriberBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            show_timestamps: true,
            show_targets: true,
            level_filter: LevelFilter::INFO,
        }
    }

    /// Toggle timestamp rendering.
    #[must_use]
    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    /// Toggle target/module rendering.
    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub fn with_level_filter(mut self, filter: LevelFilter) -> Self {
        self.level_filter = filter;
        self
    }

    /// Build the subscriber without installing it.
    #[must_use]
    pub fn build(self) -> impl Subscriber + Send + Sync + 'static {
        let layer = CaptureLayer::new(self.show_timestamps, self.show_targets);

        tracing_subscriber::registry()
            .with(self.level_filter)
            .with(layer)
    }

    /// Build and install as the global subscriber.
    pub fn init(self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        let subscriber = self.build();
        tracing::subscriber::set_global_default(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use crate::console::CaptureConsole;
    use crate::testing::RecordingSink;
    use std::sync::Arc;

    #[test]
    fn test_builder_defaults() {
        let builder = CaptureSubscriberBuilder::default();
        assert!(builder.show_timestamps);
        assert!(builder.show_targets);
        assert_eq!(builder.level_filter, LevelFilter::INFO);
    }

    #[test]
    fn test_events_reach_active_console() {
        let capture = CaptureConsole::new(
            ConsoleConfig::new()
                .with_base_console(Arc::new(RecordingSink::new()))
                .with_supports_ansi(false),
        );
        let subscriber = CaptureSubscriberBuilder::new()
            .with_timestamps(false)
            .with_targets(false)
            .with_level_filter(LevelFilter::DEBUG)
            .build();

        let result = capture.run(|| {
            tracing::subscriber::with_default(subscriber, || {
                let span = tracing::info_span!("request");
                let _entered = span.enter();
                tracing::info!(user = "ada", "signed in");
                tracing::trace!("filtered out");
                tracing::error!(target: "ghostlog::console", "internal");
            });
        });
        assert!(result.is_ok());
        assert_eq!(capture.outputs(), "INFO signed in user=ada span=request\n");
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_of(tracing::Level::WARN), log::Level::Warn);
        assert_eq!(level_of(tracing::Level::TRACE), log::Level::Trace);
    }
}
