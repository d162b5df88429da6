//! # PassthroughTask: a task whose body reports its own outcome.
//!
//! The body is a closure run once by [`PassthroughTask::start`]. It receives a
//! [`TaskHandle`] through which it reports `succeed`/`fail` (and optionally
//! `pause`/`resume`), and returns a [`Cancellable`] work handle the task keeps
//! until it finishes.
//!
//! ## Status commit
//! ```text
//! start():  lock ─► idle? ─► take body, evaluating = true, commit Active ─► unlock
//!                  └► run body(handle)            (lock released: body may call succeed())
//!           lock ─► evaluating = false
//!                  ├─ still running  → store work handle
//!                  ├─ canceled       → unlock, work.cancel()
//!                  └─ success/error  → unlock, drop work
//!
//! send(new): lock ─► current terminal?   → rejected (AlreadyTerminal)
//!                  ─► same kind as new?   → dropped (no notification)
//!                  ─► commit + notify subscribers/watchers/bus
//!                  ─► terminal? take work + children ─► unlock ─► cancel (if canceled) / drop
//! ```
//!
//! ## Rules
//! - One notification per committed transition, emitted while the lock is held.
//! - `cancel` loses against an earlier success or error and wins against everything else.
//! - The body never runs with the lock held, and never runs twice.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::builder::TaskBuilder;
use super::cancellable::Cancellable;
use super::task::ObservableTask;
use crate::error::TaskError;
use crate::events::{Bus, Event};
use crate::ids::TaskId;
use crate::status::TaskStatus;
use crate::subscribers::panic_message;

type Body<S, E> = Box<dyn FnOnce(TaskHandle<S, E>) -> Box<dyn Cancellable> + Send>;

struct State<S, E> {
    status: TaskStatus<S, E>,
    body: Option<Body<S, E>>,
    evaluating_body: bool,
    work: Option<Box<dyn Cancellable>>,
    children: Vec<Box<dyn Cancellable>>,
}

struct Inner<S, E> {
    name: Arc<str>,
    id: TaskId,
    state: Mutex<State<S, E>>,
    updates: broadcast::Sender<TaskStatus<S, E>>,
    latest: watch::Sender<TaskStatus<S, E>>,
    bus: Option<Bus>,
}

/// Work handles released by a terminal transition.
struct Released {
    cancel: bool,
    handles: Vec<Box<dyn Cancellable>>,
}

impl Released {
    fn none() -> Self {
        Self {
            cancel: false,
            handles: Vec::new(),
        }
    }

    /// Must run with the task lock released.
    fn finish(self) {
        if self.cancel {
            for handle in &self.handles {
                handle.cancel();
            }
        }
    }
}

impl<S, E> Inner<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    /// Swaps the status and notifies every channel. Caller holds the lock.
    fn commit(&self, state: &mut MutexGuard<'_, State<S, E>>, next: TaskStatus<S, E>) -> Released {
        let from = state.status.description();
        let to = next.description();
        tracing::debug!(task = %self.name, id = %self.id, %from, %to, "status changed");

        state.status = next.clone();
        let _ = self.updates.send(next.clone());
        self.latest.send_replace(next);
        if let Some(bus) = &self.bus {
            bus.publish(Event::status_changed(&self.name, &self.id, from, to));
        }

        if !state.status.is_terminal() {
            return Released::none();
        }
        let mut handles: Vec<Box<dyn Cancellable>> = state.work.take().into_iter().collect();
        handles.append(&mut state.children);
        Released {
            cancel: state.status.is_canceled(),
            handles,
        }
    }

    /// Serialized transition used by every mutator except `start`.
    fn send(&self, next: TaskStatus<S, E>) -> Result<(), TaskError> {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            let status = state.status.description();
            tracing::debug!(task = %self.name, id = %self.id, %status, to = next.description().as_label(), "transition rejected");
            return Err(TaskError::AlreadyTerminal { status });
        }
        if state.status.same_kind(&next) {
            return Ok(());
        }
        if state.status.is_idle() && !next.is_canceled() {
            return Err(TaskError::NotStarted);
        }

        let body = if next.is_canceled() {
            state.body.take()
        } else {
            None
        };
        let released = self.commit(&mut state, next);
        drop(state);
        drop(body);
        released.finish();
        Ok(())
    }

    fn start(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if !state.status.is_idle() || state.evaluating_body {
            return;
        }
        let Some(body) = state.body.take() else {
            return;
        };
        state.evaluating_body = true;
        let released = self.commit(&mut state, TaskStatus::Active);
        drop(state);
        released.finish();

        let handle = TaskHandle {
            inner: Arc::clone(self),
        };
        let work = match std::panic::catch_unwind(AssertUnwindSafe(move || body(handle))) {
            Ok(work) => work,
            Err(panic) => {
                let info = panic_message(panic.as_ref());
                tracing::warn!(task = %self.name, id = %self.id, %info, "task body panicked");
                self.state.lock().evaluating_body = false;
                let _ = self.send(TaskStatus::Canceled);
                return;
            }
        };

        let mut state = self.state.lock();
        state.evaluating_body = false;
        if state.status.is_terminal() {
            let cancel = state.status.is_canceled();
            drop(state);
            if cancel {
                work.cancel();
            }
        } else {
            state.work = Some(work);
        }
    }

    fn register(&self, child: Box<dyn Cancellable>) {
        let mut state = self.state.lock();
        if !state.status.is_terminal() {
            state.children.push(child);
            return;
        }
        let cancel = state.status.is_canceled();
        drop(state);
        if cancel {
            child.cancel();
        }
    }
}

/// # Task driven by a closure that reports its own result.
///
/// Cheap to clone; clones share the same status.
///
/// # Example
/// ```
/// use taskflux::{PassthroughTask, TaskStatus};
///
/// let task = PassthroughTask::<u32, String>::from_fn("answer", || Ok(42));
/// assert_eq!(task.status(), TaskStatus::Idle);
///
/// task.start();
/// assert_eq!(task.status(), TaskStatus::Success(42));
/// ```
pub struct PassthroughTask<S, E> {
    inner: Arc<Inner<S, E>>,
}

impl<S, E> Clone for PassthroughTask<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, E> fmt::Debug for PassthroughTask<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughTask")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl<S, E> PassthroughTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    pub(crate) fn from_parts(
        name: Arc<str>,
        id: TaskId,
        capacity: usize,
        bus: Option<Bus>,
        body: Body<S, E>,
    ) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(TaskStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                name,
                id,
                state: Mutex::new(State {
                    status: TaskStatus::Idle,
                    body: Some(body),
                    evaluating_body: false,
                    work: None,
                    children: Vec::new(),
                }),
                updates,
                latest,
                bus,
            }),
        }
    }

    /// Creates a task around `body`, with default settings.
    ///
    /// See [`TaskBuilder`] for ids, bus and channel capacity.
    pub fn new<F, W>(name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: FnOnce(TaskHandle<S, E>) -> W + Send + 'static,
        W: Cancellable,
    {
        TaskBuilder::new(name).build(body)
    }

    /// Creates a task evaluating `f` synchronously inside `start`.
    pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce() -> Result<S, E> + Send + 'static,
    {
        TaskBuilder::new(name).build_fn(f)
    }

    /// Creates a task running the future returned by `f` on the Tokio runtime
    /// current at `start` time.
    pub fn spawn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, E>> + Send + 'static,
    {
        TaskBuilder::new(name).spawn(f)
    }

    /// Returns a builder for tasks sharing a bus, id registry or config.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn id(&self) -> &TaskId {
        &self.inner.id
    }

    /// Current status snapshot.
    pub fn status(&self) -> TaskStatus<S, E> {
        self.inner.state.lock().status.clone()
    }

    /// Receiver of every subsequent transition, in commit order.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskStatus<S, E>> {
        self.inner.updates.subscribe()
    }

    /// Receiver of the latest status.
    pub fn watch(&self) -> watch::Receiver<TaskStatus<S, E>> {
        self.inner.latest.subscribe()
    }

    /// Moves an idle task to `Active` and runs its body on this thread.
    ///
    /// A no-op unless the task is idle, so the body runs at most once.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Moves the task to `Canceled` unless it already finished, and cancels
    /// the body's work handle and every registered child.
    pub fn cancel(&self) {
        if let Err(err) = self.inner.send(TaskStatus::Canceled) {
            tracing::trace!(task = %self.inner.name, reason = err.as_label(), "cancel ignored");
        }
    }

    /// Resolves with the first terminal status.
    pub async fn wait(&self) -> TaskStatus<S, E> {
        ObservableTask::wait(self).await
    }
}

#[async_trait]
impl<S, E> ObservableTask for PassthroughTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    type Success = S;
    type Error = E;

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn id(&self) -> &TaskId {
        &self.inner.id
    }

    fn status(&self) -> TaskStatus<S, E> {
        PassthroughTask::status(self)
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskStatus<S, E>> {
        PassthroughTask::subscribe(self)
    }

    fn watch(&self) -> watch::Receiver<TaskStatus<S, E>> {
        PassthroughTask::watch(self)
    }

    fn start(&self) {
        PassthroughTask::start(self)
    }

    fn cancel(&self) {
        PassthroughTask::cancel(self)
    }
}

impl<S, E> Cancellable for PassthroughTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    fn cancel(&self) {
        PassthroughTask::cancel(self)
    }
}

/// The body's side of a [`PassthroughTask`].
///
/// Only the body holds one, so only the task itself can report success,
/// failure or suspension.
pub struct TaskHandle<S, E> {
    inner: Arc<Inner<S, E>>,
}

impl<S, E> TaskHandle<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    /// Finishes the task with `value`.
    pub fn succeed(&self, value: S) -> Result<(), TaskError> {
        self.inner.send(TaskStatus::Success(value))
    }

    /// Finishes the task with `err`.
    pub fn fail(&self, err: E) -> Result<(), TaskError> {
        self.inner.send(TaskStatus::Error(err))
    }

    /// Finishes the task with either outcome of `result`.
    pub fn finish(&self, result: Result<S, E>) -> Result<(), TaskError> {
        self.inner.send(TaskStatus::from(result))
    }

    /// Reports `Active → Paused`.
    pub fn pause(&self) -> Result<(), TaskError> {
        self.inner.send(TaskStatus::Paused)
    }

    /// Reports `Paused → Active`.
    pub fn resume(&self) -> Result<(), TaskError> {
        self.inner.send(TaskStatus::Active)
    }

    /// Cancels the task from inside its body.
    pub fn cancel(&self) {
        if let Err(err) = self.inner.send(TaskStatus::Canceled) {
            tracing::trace!(task = %self.inner.name, reason = err.as_label(), "cancel ignored");
        }
    }

    /// Ties `child` to the task: it is canceled with the task, dropped when
    /// the task succeeds or fails.
    pub fn register(&self, child: impl Cancellable) {
        self.inner.register(Box::new(child));
    }

    /// Current status of the owning task.
    pub fn status(&self) -> TaskStatus<S, E> {
        self.inner.state.lock().status.clone()
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.state.lock().status.is_canceled()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

/// Body used by [`TaskBuilder::build_fn`].
pub(crate) fn sync_body<S, E, F>(f: F) -> impl FnOnce(TaskHandle<S, E>) + Send + 'static
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
    F: FnOnce() -> Result<S, E> + Send + 'static,
{
    move |handle: TaskHandle<S, E>| {
        if let Err(err) = handle.finish(f()) {
            tracing::debug!(task = handle.name(), reason = err.as_label(), "result dropped");
        }
    }
}

/// Body used by [`TaskBuilder::spawn`].
pub(crate) fn async_body<S, E, F, Fut>(
    f: F,
) -> impl FnOnce(TaskHandle<S, E>) -> Option<CancellationToken> + Send + 'static
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<S, E>> + Send + 'static,
{
    move |handle: TaskHandle<S, E>| {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(task = handle.name(), reason = TaskError::NoRuntime.as_label(), "task canceled");
            handle.cancel();
            return None;
        };

        let token = CancellationToken::new();
        let child = token.clone();
        runtime.spawn(async move {
            let work = AssertUnwindSafe(f(child.clone())).catch_unwind();
            tokio::select! {
                biased;
                _ = child.cancelled() => {}
                res = work => match res {
                    Ok(result) => {
                        if let Err(err) = handle.finish(result) {
                            tracing::debug!(task = handle.name(), reason = err.as_label(), "result dropped");
                        }
                    }
                    Err(panic) => {
                        let info = panic_message(panic.as_ref());
                        tracing::warn!(task = handle.name(), %info, "task body panicked");
                        handle.cancel();
                    }
                },
            }
        });
        Some(token)
    }
}
