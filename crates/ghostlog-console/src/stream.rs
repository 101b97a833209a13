//! Output streams and shared resize subscriptions.
//!
//! An [`OutputStream`] is where a real console's bytes go. Capturing consoles
//! only touch it for cursor control (overwritable lines) and to learn the
//! terminal width. Many consoles may sit on one stream; they share a single
//! resize subscription per stream, reference counted, released when the last
//! console using it is dropped.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use console::Term;
use ghostlog_core::logging::targets;

use crate::detection::{ColorDepth, detect_color_depth};

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

/// Callback invoked with the new size when a terminal is resized.
pub type ResizeListener = Arc<dyn Fn(TerminalSize) + Send + Sync>;

/// Handle returned when registering a resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A writable output destination.
pub trait OutputStream: Send + Sync {
    /// Writes text verbatim.
    fn write_str(&self, text: &str) -> io::Result<()>;

    /// Whether the destination is an interactive terminal.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Current dimensions, when known.
    fn size(&self) -> Option<TerminalSize> {
        None
    }

    /// Color capability of the destination.
    fn color_depth(&self) -> ColorDepth {
        ColorDepth::None
    }

    /// Registers a resize listener. `None` when the stream never resizes.
    fn add_resize_listener(&self, _listener: ResizeListener) -> Option<ListenerId> {
        None
    }

    /// Unregisters a resize listener. `false` when unsupported or unknown.
    fn remove_resize_listener(&self, _id: ListenerId) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────
// Listener registry
// ─────────────────────────────────────────────────────────

/// Resize listener bookkeeping for stream implementations.
#[derive(Default)]
pub struct ResizeListeners {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ResizeListener)>>,
}

impl ResizeListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: ResizeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Notifies every listener. Listeners run outside the registry lock.
    pub fn emit(&self, size: TerminalSize) {
        let snapshot: Vec<ResizeListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(size);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResizeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeListeners")
            .field("len", &self.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────
// Terminal streams
// ─────────────────────────────────────────────────────────

/// Standard output or standard error of the process.
///
/// Resize notifications are driven by the host: call
/// [`TermStream::poll_resize`] from a resize signal handler or event loop.
pub struct TermStream {
    term: Term,
    listeners: ResizeListeners,
    last_size: Mutex<Option<TerminalSize>>,
}

impl TermStream {
    /// The process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Term::stdout())
    }

    /// The process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Term::stderr())
    }

    fn new(term: Term) -> Self {
        let size = read_size(&term);
        Self {
            term,
            listeners: ResizeListeners::new(),
            last_size: Mutex::new(size),
        }
    }

    /// Re-reads the terminal size and notifies listeners if it changed.
    pub fn poll_resize(&self) {
        let current = read_size(&self.term);
        let changed = {
            let mut last = self
                .last_size
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let changed = current.is_some() && *last != current;
            *last = current;
            changed
        };
        if let (true, Some(size)) = (changed, current) {
            log::trace!(target: targets::STREAM, "terminal resized to {}x{}", size.columns, size.rows);
            self.listeners.emit(size);
        }
    }
}

fn read_size(term: &Term) -> Option<TerminalSize> {
    term.size_checked()
        .map(|(rows, columns)| TerminalSize { columns, rows })
}

impl OutputStream for TermStream {
    fn write_str(&self, text: &str) -> io::Result<()> {
        self.term.write_str(text)
    }

    fn is_terminal(&self) -> bool {
        self.term.is_term()
    }

    fn size(&self) -> Option<TerminalSize> {
        read_size(&self.term)
    }

    fn color_depth(&self) -> ColorDepth {
        detect_color_depth(self.term.is_term())
    }

    fn add_resize_listener(&self, listener: ResizeListener) -> Option<ListenerId> {
        Some(self.listeners.add(listener))
    }

    fn remove_resize_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl std::fmt::Debug for TermStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermStream")
            .field("is_terminal", &self.term.is_term())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────
// Shared subscriptions
// ─────────────────────────────────────────────────────────

struct SharedEntry {
    refs: usize,
    listener: Option<ListenerId>,
    columns: Arc<AtomicU16>,
    stream: Arc<dyn OutputStream>,
}

static SUBSCRIPTIONS: LazyLock<Mutex<HashMap<usize, SharedEntry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn stream_key(stream: &Arc<dyn OutputStream>) -> usize {
    Arc::as_ptr(stream).cast::<()>() as usize
}

/// One console's share of a stream's resize subscription.
///
/// The first share subscribes; dropping the last share unsubscribes.
pub struct ResizeSubscription {
    key: usize,
    columns: Arc<AtomicU16>,
}

impl ResizeSubscription {
    /// Joins (or creates) the shared subscription for `stream`.
    #[must_use]
    pub fn acquire(stream: &Arc<dyn OutputStream>) -> Self {
        let key = stream_key(stream);
        let mut registry = SUBSCRIPTIONS.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = registry.entry(key).or_insert_with(|| {
            let columns = Arc::new(AtomicU16::new(
                stream.size().map_or(0, |size| size.columns),
            ));
            let target = columns.clone();
            let listener = stream.add_resize_listener(Arc::new(move |size: TerminalSize| {
                target.store(size.columns, Ordering::Relaxed);
            }));
            log::debug!(target: targets::STREAM, "subscribed to resize events (listener: {listener:?})");
            SharedEntry {
                refs: 0,
                listener,
                columns,
                stream: stream.clone(),
            }
        });
        entry.refs += 1;
        Self {
            key,
            columns: entry.columns.clone(),
        }
    }

    /// Last known terminal width, if any.
    #[must_use]
    pub fn columns(&self) -> Option<u16> {
        match self.columns.load(Ordering::Relaxed) {
            0 => None,
            n => Some(n),
        }
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        let released = {
            let mut registry = SUBSCRIPTIONS.lock().unwrap_or_else(PoisonError::into_inner);
            match registry.get_mut(&self.key) {
                Some(entry) if entry.refs > 1 => {
                    entry.refs -= 1;
                    None
                }
                Some(_) => registry.remove(&self.key),
                None => None,
            }
        };

        if let Some(entry) = released {
            let removed = entry
                .listener
                .is_some_and(|id| entry.stream.remove_resize_listener(id));
            if !removed {
                log::debug!(target: targets::STREAM, "stream cannot unsubscribe; ignoring");
            } else {
                log::debug!(target: targets::STREAM, "released resize subscription");
            }
        }
    }
}

impl std::fmt::Debug for ResizeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeSubscription")
            .field("columns", &self.columns())
            .finish()
    }
}

/// Number of consoles currently sharing `stream`'s resize subscription.
#[must_use]
pub fn subscription_count(stream: &Arc<dyn OutputStream>) -> usize {
    SUBSCRIPTIONS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&stream_key(stream))
        .map_or(0, |entry| entry.refs)
}
