//! A stand-in for the real console that records forwarded calls

use std::sync::{Arc, Mutex, PoisonError};

use ghostlog_core::value::Value;

use crate::method::Method;
use crate::sink::ConsoleSink;
use crate::stream::OutputStream;

/// One forwarded call, arguments exactly as received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<RecordedCall>,
    clears: usize,
}

/// Records every call and clear it receives instead of printing.
///
/// Give it a stream with [`RecordingSink::with_stream`] to observe the
/// cursor control a capturing console writes for overwritable lines.
#[derive(Default)]
pub struct RecordingSink {
    recording: Mutex<Recording>,
    stream: Option<Arc<dyn OutputStream>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an output stream
    #[must_use]
    pub fn with_stream(mut self, stream: Arc<dyn OutputStream>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }

    /// Methods received so far, in order
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    /// Number of `clear` calls received
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clears
    }
}

impl ConsoleSink for RecordingSink {
    fn call(&self, method: Method, args: &[Value]) {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .push(RecordedCall {
                method,
                args: args.to_vec(),
            });
    }

    fn clear(&self) {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clears += 1;
    }

    fn stream(&self) -> Option<Arc<dyn OutputStream>> {
        self.stream.clone()
    }
}

impl std::fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSink")
            .field("calls", &self.calls().len())
            .field("clears", &self.clear_count())
            .field("has_stream", &self.stream.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_verbatim() {
        let sink = RecordingSink::new();
        sink.call(Method::Log, &["%s".into(), 1.into()]);
        sink.call(Method::Error, &[]);
        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0].as_str(), Some("%s"));
        assert_eq!(sink.methods(), vec![Method::Log, Method::Error]);
    }

    #[test]
    fn test_counts_clears() {
        let sink = RecordingSink::new();
        sink.clear();
        sink.clear();
        assert_eq!(sink.clear_count(), 2);
        assert!(sink.stream().is_none());
    }
}
