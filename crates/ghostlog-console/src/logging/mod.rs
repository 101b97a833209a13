//! Bridges from the `log` and `tracing` ecosystems.
//!
//! Records emitted through either facade are rendered as one line and sent
//! to whichever capturing console is active for the emitting task, so a
//! scoped run captures library diagnostics alongside direct console calls:
//! - [`CaptureLogger`] - a `log` crate logger
//! - [`CaptureLayer`] / [`CaptureSubscriberBuilder`] - a tracing layer
//!
//! ghostlog's own records (targets under `ghostlog`) are never captured.
//!
//! # Example
//!
//! ```ignore
//! use ghostlog_console::logging::CaptureLogger;
//!
//! CaptureLogger::builder().level(log::Level::Debug).init()?;
//! capture.run(|| log::info!("captured"))?;
//! ```

mod logger;
mod subscriber;

pub use logger::{CaptureLogger, CaptureLoggerBuilder};
pub use subscriber::{CaptureLayer, CaptureSubscriberBuilder};

use log::Level;
use time::OffsetDateTime;
use time::macros::format_description;

use ghostlog_core::value::Value;

use crate::method::Method;
use crate::router;

/// One record on its way to a console.
#[derive(Debug, Clone)]
pub(crate) struct LogEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub timestamp: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl LogEvent {
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
            timestamp: None,
            fields: Vec::new(),
        }
    }

    /// Stamps the event with the current UTC time of day.
    pub fn stamped(mut self) -> Self {
        let format = format_description!("[hour]:[minute]:[second]");
        self.timestamp = OffsetDateTime::now_utc().format(format).ok();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// `12:00:00 INFO target: message key=value`
    pub fn render(&self, show_target: bool) -> String {
        let mut line = String::new();
        if let Some(ts) = &self.timestamp {
            line.push_str(ts);
            line.push(' ');
        }
        line.push_str(self.level.as_str());
        line.push(' ');
        if show_target && !self.target.is_empty() {
            line.push_str(&self.target);
            line.push_str(": ");
        }
        line.push_str(&self.message);
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    /// Sends the rendered line to the active console.
    ///
    /// The line goes through a `%s` template so percent signs in messages
    /// print verbatim.
    pub fn emit(&self, show_target: bool) {
        router::active().call(
            Method::from(self.level),
            &[Value::from("%s"), Value::from(self.render(show_target))],
        );
    }
}
