//! Console-like sinks: where forwarded calls end up.
//!
//! A [`ConsoleSink`] receives the original arguments of a call and performs
//! its own formatting. [`StdConsole`] is the real platform console; capturing
//! consoles implement the trait too, so they can be chained.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use ghostlog_core::format::FormatOptions;
use ghostlog_core::logging::targets;
use ghostlog_core::value::Value;

use crate::calls::CallState;
use crate::escapes;
use crate::method::Method;
use crate::stream::{OutputStream, TermStream};

/// A console-like call target.
pub trait ConsoleSink: Send + Sync {
    /// Performs `method` with the original call arguments.
    fn call(&self, method: Method, args: &[Value]);

    /// Clears the console.
    fn clear(&self);

    /// The output stream used for cursor control, if any.
    fn stream(&self) -> Option<Arc<dyn OutputStream>> {
        None
    }
}

/// Shared handle to a sink.
pub type SinkRef = Arc<dyn ConsoleSink>;

/// The real platform console: stdout for regular output, stderr for
/// warnings, errors and failed assertions.
pub struct StdConsole {
    stdout: Arc<dyn OutputStream>,
    stderr: Arc<dyn OutputStream>,
    options: FormatOptions,
    state: Mutex<CallState>,
}

impl StdConsole {
    /// A console over the process's standard streams.
    ///
    /// Consoles created this way share one pair of stream handles, so resize
    /// subscriptions against them are shared too.
    #[must_use]
    pub fn new() -> Self {
        let (stdout, stderr) = process_streams();
        Self::with_streams(stdout, stderr)
    }

    /// A console over arbitrary streams.
    #[must_use]
    pub fn with_streams(stdout: Arc<dyn OutputStream>, stderr: Arc<dyn OutputStream>) -> Self {
        Self {
            stdout,
            stderr,
            options: FormatOptions::default(),
            state: Mutex::new(CallState::new()),
        }
    }

    /// Set the formatting options; colors are still decided per stream.
    #[must_use]
    pub fn with_format(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    /// The process-wide real console.
    #[must_use]
    pub fn shared() -> Arc<StdConsole> {
        static SHARED: OnceLock<Arc<StdConsole>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(StdConsole::new())).clone()
    }

    fn write(stream: &dyn OutputStream, text: &str) {
        if let Err(err) = stream.write_str(text) {
            log::warn!(target: targets::STREAM, "console write failed: {err}");
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

fn process_streams() -> (Arc<dyn OutputStream>, Arc<dyn OutputStream>) {
    static STREAMS: OnceLock<(Arc<dyn OutputStream>, Arc<dyn OutputStream>)> = OnceLock::new();
    STREAMS
        .get_or_init(|| (Arc::new(TermStream::stdout()), Arc::new(TermStream::stderr())))
        .clone()
}

impl ConsoleSink for StdConsole {
    fn call(&self, method: Method, args: &[Value]) {
        let output = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(method, args);
        let Some(output) = output else {
            return;
        };

        let stream = if output.diagnostic {
            &self.stderr
        } else {
            &self.stdout
        };
        let colors = stream.color_depth().has_color();
        let options = self
            .options
            .with_inspect(self.options.inspect.with_colors(colors));
        let mut text = output.to_text(&options);
        text.push('\n');
        Self::write(stream.as_ref(), &text);
    }

    fn clear(&self) {
        if self.stdout.is_terminal() {
            Self::write(self.stdout.as_ref(), escapes::CLEAR_SCREEN);
        }
    }

    fn stream(&self) -> Option<Arc<dyn OutputStream>> {
        Some(self.stdout.clone())
    }
}

impl std::fmt::Debug for StdConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdConsole")
            .field("stdout_is_terminal", &self.stdout.is_terminal())
            .field("stderr_is_terminal", &self.stderr.is_terminal())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStream;

    fn console() -> (StdConsole, Arc<MemoryStream>, Arc<MemoryStream>) {
        let out = Arc::new(MemoryStream::new());
        let err = Arc::new(MemoryStream::new());
        (StdConsole::with_streams(out.clone(), err.clone()), out, err)
    }

    #[test]
    fn test_routes_by_method() {
        let (console, out, err) = console();
        console.call(Method::Log, &["hello %s".into(), "there".into()]);
        console.call(Method::Warn, &["careful".into()]);
        console.call(Method::Assert, &[false.into()]);
        assert_eq!(out.contents(), "hello there\n");
        assert_eq!(err.contents(), "careful\nAssertion failed\n");
    }

    #[test]
    fn test_keeps_its_own_counters() {
        let (console, out, _) = console();
        console.call(Method::Count, &[]);
        console.call(Method::Count, &[]);
        assert_eq!(out.contents(), "default: 1\ndefault: 2\n");
    }

    #[test]
    fn test_clear_only_on_terminals() {
        let (console, out, _) = console();
        console.clear();
        assert_eq!(out.contents(), "");

        let tty = Arc::new(MemoryStream::terminal(80, 24));
        let console = StdConsole::with_streams(tty.clone(), Arc::new(MemoryStream::new()));
        console.clear();
        assert_eq!(tty.contents(), escapes::CLEAR_SCREEN);
    }

    #[test]
    fn test_colors_follow_stream() {
        let tty = Arc::new(MemoryStream::terminal(80, 24));
        let console = StdConsole::with_streams(tty.clone(), Arc::new(MemoryStream::new()));
        console.call(Method::Log, &[1.into()]);
        assert!(tty.contents().contains('\x1b'));
    }

    #[test]
    fn test_shared_is_shared() {
        assert!(Arc::ptr_eq(&StdConsole::shared(), &StdConsole::shared()));
    }
}
