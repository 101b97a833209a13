//! In-memory output stream for tests

use std::io;
use std::sync::{Mutex, PoisonError};

use crate::detection::ColorDepth;
use crate::stream::{ListenerId, OutputStream, ResizeListener, ResizeListeners, TerminalSize};

/// An [`OutputStream`] that keeps everything written to it.
///
/// A plain stream behaves like a pipe: not a terminal, no size, no resize
/// events. [`MemoryStream::terminal`] behaves like a resizable 16-color
/// terminal; call [`MemoryStream::resize`] to fire resize events.
#[derive(Debug, Default)]
pub struct MemoryStream {
    written: Mutex<String>,
    size: Mutex<Option<TerminalSize>>,
    listeners: Option<ResizeListeners>,
}

impl MemoryStream {
    /// A non-terminal stream
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal of the given size
    #[must_use]
    pub fn terminal(columns: u16, rows: u16) -> Self {
        Self {
            written: Mutex::new(String::new()),
            size: Mutex::new(Some(TerminalSize { columns, rows })),
            listeners: Some(ResizeListeners::new()),
        }
    }

    /// Everything written so far
    #[must_use]
    pub fn contents(&self) -> String {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard everything written so far
    pub fn reset(&self) {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Change the size and notify listeners
    pub fn resize(&self, size: TerminalSize) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = Some(size);
        if let Some(listeners) = &self.listeners {
            listeners.emit(size);
        }
    }

    /// Number of registered resize listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.as_ref().map_or(0, ResizeListeners::len)
    }
}

impl OutputStream for MemoryStream {
    fn write_str(&self, text: &str) -> io::Result<()> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.listeners.is_some()
    }

    fn size(&self) -> Option<TerminalSize> {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn color_depth(&self) -> ColorDepth {
        if self.is_terminal() {
            ColorDepth::Ansi16
        } else {
            ColorDepth::None
        }
    }

    fn add_resize_listener(&self, listener: ResizeListener) -> Option<ListenerId> {
        self.listeners.as_ref().map(|listeners| listeners.add(listener))
    }

    fn remove_resize_listener(&self, id: ListenerId) -> bool {
        self.listeners
            .as_ref()
            .is_some_and(|listeners| listeners.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_stream() {
        let stream = MemoryStream::new();
        stream.write_str("a").ok();
        stream.write_str("b").ok();
        assert_eq!(stream.contents(), "ab");
        assert!(!stream.is_terminal());
        assert_eq!(stream.size(), None);
        assert_eq!(stream.color_depth(), ColorDepth::None);
        stream.reset();
        assert_eq!(stream.contents(), "");
    }

    #[test]
    fn test_terminal_stream_resizes() {
        let stream = MemoryStream::terminal(80, 24);
        assert!(stream.is_terminal());
        stream.resize(TerminalSize { columns: 40, rows: 10 });
        assert_eq!(stream.size().map(|s| s.columns), Some(40));
    }
}
