//! Context routing: which capturing console receives a call.
//!
//! Every logical execution path (a tokio task, or a plain thread outside
//! any task) has at most one active console. The resolution strategy is
//! replaceable through [`set_strategy`]:
//!
//! - [`TaskLocalStrategy`] (default) binds scoped runs with a tokio task
//!   local, so concurrent tasks never see each other's console. Persistent
//!   rebinds are keyed by tokio task id, or by thread for code running
//!   outside any task. Spawned tasks start unbound; carry the binding
//!   across with [`bind`] or [`spawn`].
//! - [`GlobalCellStrategy`] keeps one process-wide cell with save/restore
//!   around scoped runs. Concurrent scoped runs can observe each other's
//!   binding; use it only where execution is not concurrent.
//!
//! When nothing is bound the process-wide default console is used.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock};

use ghostlog_core::logging::targets;
use ghostlog_core::{Error, Result};

use crate::console::ConsoleRef;
use crate::global::default_console;

/// A type-erased future run inside a binding.
pub type ScopedFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A resolution strategy for the active console.
///
/// Implementations must restore the previous binding once a scoped body
/// finishes, including when it panics.
pub trait ContextStrategy: Send + Sync {
    /// The console bound to the caller's execution path, if any.
    fn active(&self) -> Option<ConsoleRef>;

    /// Rebinds the caller's execution path from now on.
    fn set_active(&self, console: ConsoleRef);

    /// Runs `body` with `console` bound.
    fn run_scoped(&self, console: ConsoleRef, body: &mut dyn FnMut());

    /// Wraps `future` so that `console` is bound whenever it is polled.
    fn scope_future<'a>(&self, console: ConsoleRef, future: ScopedFuture<'a>) -> ScopedFuture<'a>;

    /// Drops the caller's persistent binding, if the strategy keeps one.
    fn clear_active(&self) {}
}

// ─────────────────────────────────────────────────────────
// Task-local strategy
// ─────────────────────────────────────────────────────────

tokio::task_local! {
    static SCOPED: RefCell<Option<ConsoleRef>>;
}

thread_local! {
    static PERSISTENT: RefCell<Option<ConsoleRef>> = const { RefCell::new(None) };
}

/// Persistent rebinds made by unscoped tokio tasks.
///
/// A worker thread runs many tasks, so these cannot live in the thread
/// cell. An entry lives until its task rebinds or calls [`clear_active`].
static TASK_BINDINGS: LazyLock<Mutex<HashMap<tokio::task::Id, ConsoleRef>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn task_bindings() -> std::sync::MutexGuard<'static, HashMap<tokio::task::Id, ConsoleRef>> {
    TASK_BINDINGS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Task-local bindings, falling back to a per-task or per-thread cell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskLocalStrategy;

impl TaskLocalStrategy {
    fn persistent(&self) -> Option<ConsoleRef> {
        match tokio::task::try_id() {
            Some(id) => task_bindings().get(&id).cloned(),
            None => PERSISTENT.with(|cell| cell.borrow().clone()),
        }
    }
}

impl ContextStrategy for TaskLocalStrategy {
    fn active(&self) -> Option<ConsoleRef> {
        SCOPED
            .try_with(|cell| cell.borrow().clone())
            .ok()
            .flatten()
            .or_else(|| self.persistent())
    }

    fn set_active(&self, console: ConsoleRef) {
        // Inside a scope the rebind lasts until the scope ends.
        let mut console = Some(console);
        let _ = SCOPED.try_with(|cell| {
            *cell.borrow_mut() = console.take();
        });
        let Some(console) = console else {
            return;
        };
        match tokio::task::try_id() {
            Some(id) => {
                log::trace!(target: targets::ROUTER, "binding console to task {id}");
                task_bindings().insert(id, console);
            }
            None => PERSISTENT.with(|cell| *cell.borrow_mut() = Some(console)),
        }
    }

    fn clear_active(&self) {
        match tokio::task::try_id() {
            Some(id) => {
                task_bindings().remove(&id);
            }
            None => PERSISTENT.with(|cell| *cell.borrow_mut() = None),
        }
    }

    fn run_scoped(&self, console: ConsoleRef, body: &mut dyn FnMut()) {
        SCOPED.sync_scope(RefCell::new(Some(console)), body);
    }

    fn scope_future<'a>(&self, console: ConsoleRef, future: ScopedFuture<'a>) -> ScopedFuture<'a> {
        Box::pin(SCOPED.scope(RefCell::new(Some(console)), future))
    }
}

// ─────────────────────────────────────────────────────────
// Global cell strategy
// ─────────────────────────────────────────────────────────

/// One process-wide binding with save/restore around scoped runs.
#[derive(Debug, Default, Clone)]
pub struct GlobalCellStrategy {
    cell: Arc<Mutex<Option<ConsoleRef>>>,
}

impl GlobalCellStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Restores the cell's previous value when dropped.
struct Restore {
    cell: Arc<Mutex<Option<ConsoleRef>>>,
    previous: Option<ConsoleRef>,
}

impl Restore {
    fn bind(cell: &Arc<Mutex<Option<ConsoleRef>>>, console: ConsoleRef) -> Self {
        let previous = cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(console);
        Self {
            cell: cell.clone(),
            previous,
        }
    }
}

impl Drop for Restore {
    fn drop(&mut self) {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = self.previous.take();
    }
}

impl ContextStrategy for GlobalCellStrategy {
    fn active(&self) -> Option<ConsoleRef> {
        self.cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active(&self, console: ConsoleRef) {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = Some(console);
    }

    fn clear_active(&self) {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn run_scoped(&self, console: ConsoleRef, body: &mut dyn FnMut()) {
        let _restore = Restore::bind(&self.cell, console);
        body();
    }

    fn scope_future<'a>(&self, console: ConsoleRef, future: ScopedFuture<'a>) -> ScopedFuture<'a> {
        let cell = self.cell.clone();
        Box::pin(async move {
            let _restore = Restore::bind(&cell, console);
            future.await;
        })
    }
}

// ─────────────────────────────────────────────────────────
// Installed strategy
// ─────────────────────────────────────────────────────────

static STRATEGY: LazyLock<RwLock<Arc<dyn ContextStrategy>>> =
    LazyLock::new(|| RwLock::new(Arc::new(TaskLocalStrategy)));

/// Installs a resolution strategy, returning the previous one.
pub fn set_strategy(strategy: Arc<dyn ContextStrategy>) -> Arc<dyn ContextStrategy> {
    log::debug!(target: targets::ROUTER, "installing context strategy");
    let mut slot = STRATEGY.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, strategy)
}

/// The installed resolution strategy.
#[must_use]
pub fn strategy() -> Arc<dyn ContextStrategy> {
    STRATEGY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Reinstalls [`TaskLocalStrategy`].
pub fn reset_strategy() -> Arc<dyn ContextStrategy> {
    set_strategy(Arc::new(TaskLocalStrategy))
}

// ─────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────

/// The console bound to the caller, or the default console.
#[must_use]
pub fn active() -> ConsoleRef {
    bound().unwrap_or_else(default_console)
}

/// The console explicitly bound to the caller, if any.
#[must_use]
pub fn bound() -> Option<ConsoleRef> {
    strategy().active()
}

/// Rebinds the caller's execution path from now on.
pub fn set_active(console: ConsoleRef) {
    strategy().set_active(console);
}

/// Drops the caller's persistent binding, returning it to the default
/// console. Scoped bindings are unaffected.
pub fn clear_active() {
    strategy().clear_active();
}

/// Runs `f` with `console` active and returns its result.
///
/// The previous binding is restored when `f` returns or panics.
pub fn run_scoped<R>(console: ConsoleRef, f: impl FnOnce() -> R) -> Result<R> {
    run_scoped_with(strategy().as_ref(), console, f)
}

fn run_scoped_with<R>(
    strategy: &dyn ContextStrategy,
    console: ConsoleRef,
    f: impl FnOnce() -> R,
) -> Result<R> {
    let mut f = Some(f);
    let mut result = None;
    strategy.run_scoped(console, &mut || {
        if let Some(f) = f.take() {
            result = Some(f());
        }
    });
    result.ok_or_else(|| {
        log::warn!(target: targets::ROUTER, "context strategy skipped a scoped body");
        Error::ScopeNotEntered
    })
}

/// Runs `future` with `console` active at every poll and returns its output.
pub async fn run_scoped_async<F>(console: ConsoleRef, future: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    let strategy = strategy();
    let mut result = None;
    {
        let slot = &mut result;
        let body: ScopedFuture<'_> = Box::pin(async move {
            *slot = Some(future.await);
        });
        strategy.scope_future(console, body).await;
    }
    result.ok_or_else(|| {
        log::warn!(target: targets::ROUTER, "context strategy skipped a scoped future");
        Error::ScopeNotEntered
    })
}

/// Binds `future` to the caller's current console.
///
/// Use this for work that outlives the current task, such as spawned tasks,
/// which otherwise start unbound.
pub fn bind<F>(future: F) -> impl Future<Output = Result<F::Output>> + Send
where
    F: Future + Send,
    F::Output: Send,
{
    let console = active();
    run_scoped_async(console, future)
}

/// Spawns `future` on the tokio runtime with the caller's current console.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<Result<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(bind(future))
}
