//! The capturing console.
//!
//! A [`CaptureConsole`] presents the console method surface, records what
//! each call prints into a plain-text buffer and an HTML buffer, and can
//! forward the original call to a base console. Which instance a call
//! reaches is decided by the [router](crate::router); this type only deals
//! with what happens once it has been chosen.
//!
//! # Example
//!
//! ```ignore
//! use ghostlog_console::{CaptureConsole, ConsoleConfig, console_log};
//!
//! let capture = CaptureConsole::new(ConsoleConfig::new());
//! capture.run(|| console_log!("Hello, %s!", "World"))?;
//! assert_eq!(capture.outputs(), "Hello, World!\n");
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ghostlog_core::Result;
use ghostlog_core::format::FormatOptions;
use ghostlog_core::logging::targets;
use ghostlog_core::value::{ErrorValue, Value};

use crate::calls::CallState;
use crate::config::{ConsoleConfig, ErrorHandler};
use crate::escapes;
use crate::method::{Method, MethodTable};
use crate::router;
use crate::sink::{ConsoleSink, SinkRef};
use crate::stream::{OutputStream, ResizeSubscription};

/// Shared handle to a capturing console.
pub type ConsoleRef = Arc<CaptureConsole>;

/// The overwritable line currently on screen.
#[derive(Debug, Clone)]
struct FreshLine {
    id: String,
    rows: usize,
}

#[derive(Debug, Default)]
struct Buffers {
    outputs: String,
    #[cfg(feature = "html")]
    outputs_html: String,
    last_fresh_line: Option<FreshLine>,
    calls: CallState,
}

/// A console that captures its output.
pub struct CaptureConsole {
    record_output: bool,
    real_console_output: bool,
    supports_ansi: bool,
    error_handler: Option<ErrorHandler>,
    base: SinkRef,
    format: FormatOptions,
    table: MethodTable,
    buffers: Mutex<Buffers>,
    stream: Option<Arc<dyn OutputStream>>,
    resize: Option<ResizeSubscription>,
}

macro_rules! console_methods {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, args: &[Value]) {
                self.call($method, args);
            }
        )*
    };
}

impl CaptureConsole {
    /// Creates a console from a partial configuration.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> ConsoleRef {
        let settings = config.resolve();
        let stream = settings.base_console.stream();
        let resize = match (&stream, settings.supports_ansi) {
            (Some(stream), true) => Some(ResizeSubscription::acquire(stream)),
            _ => None,
        };
        log::debug!(
            target: targets::CONSOLE,
            "new capturing console (record: {}, forward: {}, ansi: {})",
            settings.record_output,
            settings.real_console_output,
            settings.supports_ansi
        );

        Arc::new(Self {
            record_output: settings.record_output,
            real_console_output: settings.real_console_output,
            supports_ansi: settings.supports_ansi,
            error_handler: settings.error_handler,
            table: MethodTable::new(
                settings.record_output,
                settings.real_console_output,
                settings.extended_methods,
            ),
            base: settings.base_console,
            format: settings.format,
            buffers: Mutex::new(Buffers::default()),
            stream,
            resize,
        })
    }

    /// Creates a console with every default.
    #[must_use]
    pub fn with_defaults() -> ConsoleRef {
        Self::new(ConsoleConfig::default())
    }

    fn buffers(&self) -> MutexGuard<'_, Buffers> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────
    // Interception
    // ─────────────────────────────────────────────────

    /// Performs one console call.
    pub fn call(&self, method: Method, args: &[Value]) {
        if let (Method::Error, [Value::Error(err)], Some(handler)) =
            (method, args, &self.error_handler)
        {
            log::trace!(target: targets::CONSOLE, "error call handed to error handler");
            handler(err);
            return;
        }

        let capability = self.table.get(method);
        self.record(method, args, capability.record, false);
        if capability.forward {
            self.base.call(method, args);
        }
    }

    /// Resets the overwritable line, updates the call bookkeeping and, when
    /// `keep` is set, appends the call to both buffers. Returns the rendered
    /// text, group indentation included, when the call was kept or `render`
    /// asks for it.
    fn record(&self, method: Method, args: &[Value], keep: bool, render: bool) -> Option<String> {
        let mut buffers = self.buffers();
        buffers.last_fresh_line = None;
        let output = buffers.calls.resolve(method, args)?;
        if !keep && !render {
            return None;
        }
        let text = output.to_text(&self.format);
        if keep {
            buffers.outputs.push_str(&text);
            buffers.outputs.push('\n');
            #[cfg(feature = "html")]
            {
                let html = output.to_html(&self.format);
                buffers.outputs_html.push_str(&html);
                buffers.outputs_html.push_str("<br>\n");
            }
        }
        Some(text)
    }

    console_methods! {
        /// `console.log`
        log => Method::Log;
        /// `console.info`
        info => Method::Info;
        /// `console.warn`
        warn => Method::Warn;
        /// `console.debug`
        debug => Method::Debug;
        /// `console.error`
        error => Method::Error;
        /// `console.table`: `[data]` or `[data, columns]`
        table => Method::Table;
        /// `console.dir`
        dir => Method::Dir;
        /// `console.assert`: `[condition, ...message]`
        assert => Method::Assert;
        count => Method::Count;
        count_reset => Method::CountReset;
        time => Method::Time;
        time_log => Method::TimeLog;
        time_end => Method::TimeEnd;
        group => Method::Group;
        group_collapsed => Method::GroupCollapsed;
        group_end => Method::GroupEnd;
    }

    /// Logs `args` as a line that the next `fresh_line` with the same `id`
    /// replaces on screen.
    ///
    /// Replacement needs ANSI support and a base console with an output
    /// stream; otherwise this is an ordinary `log`.
    pub fn fresh_line(&self, id: &str, args: &[Value]) {
        let erase = {
            let buffers = self.buffers();
            match (&buffers.last_fresh_line, self.supports_ansi) {
                (Some(last), true) if last.id == id => last.rows,
                _ => 0,
            }
        };
        if erase > 0 {
            if let Some(stream) = &self.stream {
                if let Err(err) = stream.write_str(&escapes::erase_rows(erase)) {
                    log::warn!(target: targets::STREAM, "failed to erase line: {err}");
                }
            }
        }

        let capability = self.table.get(Method::Log);
        let text = self.record(Method::Log, args, capability.record, true);
        if capability.forward {
            self.base.call(Method::Log, args);
        }

        let rows = text.map_or(1, |text| self.rows_for(&text));
        self.buffers().last_fresh_line = Some(FreshLine {
            id: id.to_string(),
            rows,
        });
    }

    /// Terminal rows `text` occupies once printed.
    fn rows_for(&self, text: &str) -> usize {
        let columns = self
            .resize
            .as_ref()
            .and_then(ResizeSubscription::columns)
            .map(usize::from);
        text.split('\n')
            .map(|line| match columns {
                Some(columns) if columns > 0 => {
                    ::console::measure_text_width(line).div_ceil(columns).max(1)
                }
                _ => 1,
            })
            .sum()
    }

    /// Empties both buffers and forgets the overwritable line.
    pub fn clear(&self) {
        {
            let mut buffers = self.buffers();
            buffers.last_fresh_line = None;
            buffers.outputs.clear();
            #[cfg(feature = "html")]
            buffers.outputs_html.clear();
        }
        if self.real_console_output {
            self.base.clear();
        }
    }

    // ─────────────────────────────────────────────────
    // Routing
    // ─────────────────────────────────────────────────

    /// Makes this console the active one for the current execution path,
    /// from now on.
    pub fn activate(self: &Arc<Self>) {
        router::set_active(self.clone());
    }

    /// Runs `f` with this console active, restoring the previous binding
    /// afterwards.
    pub fn run<R>(self: &Arc<Self>, f: impl FnOnce() -> R) -> Result<R> {
        router::run_scoped(self.clone(), f)
    }

    /// Runs `future` with this console active for every poll.
    pub async fn run_async<F>(self: &Arc<Self>, future: F) -> Result<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        router::run_scoped_async(self.clone(), future).await
    }

    // ─────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────

    /// Plain text recorded so far
    #[must_use]
    pub fn outputs(&self) -> String {
        self.buffers().outputs.clone()
    }

    /// HTML recorded so far
    #[cfg(feature = "html")]
    #[must_use]
    pub fn outputs_html(&self) -> String {
        self.buffers().outputs_html.clone()
    }

    /// The console forwarded calls go to
    #[must_use]
    pub fn base(&self) -> SinkRef {
        self.base.clone()
    }

    #[must_use]
    pub fn records_output(&self) -> bool {
        self.record_output
    }

    #[must_use]
    pub fn forwards_output(&self) -> bool {
        self.real_console_output
    }

    #[must_use]
    pub fn supports_ansi(&self) -> bool {
        self.supports_ansi
    }

    /// Last known width of the base console's terminal
    #[must_use]
    pub fn columns(&self) -> Option<u16> {
        self.resize.as_ref().and_then(ResizeSubscription::columns)
    }

    /// Hands `err` to the error handler, or logs it through `error`.
    pub fn report(&self, err: ErrorValue) {
        self.call(Method::Error, &[Value::Error(err)]);
    }
}

impl ConsoleSink for CaptureConsole {
    fn call(&self, method: Method, args: &[Value]) {
        CaptureConsole::call(self, method, args);
    }

    fn clear(&self) {
        CaptureConsole::clear(self);
    }

    fn stream(&self) -> Option<Arc<dyn OutputStream>> {
        self.stream.clone()
    }
}

impl std::fmt::Debug for CaptureConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureConsole")
            .field("record_output", &self.record_output)
            .field("real_console_output", &self.real_console_output)
            .field("supports_ansi", &self.supports_ansi)
            .field("error_handler", &self.error_handler.is_some())
            .field("buffered_bytes", &self.buffers().outputs.len())
            .finish_non_exhaustive()
    }
}
