//! # Observable task contract.
//!
//! [`ObservableTask`] is what every task type exposes: a stable name and id, a
//! status snapshot, ordered change notifications, and `start`/`cancel` as the
//! only external mutators.
//!
//! A task may only change its own status; observers get read-only receivers.

use std::fmt;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, watch};

use crate::error::TaskError;
use crate::ids::TaskId;
use crate::status::{TaskStatus, TaskStatusDescription};

/// # Single-shot unit of work with an observable status.
///
/// ### Rules
/// - Created `Idle`; [`start`](Self::start) is a no-op unless the task is still idle.
/// - [`cancel`](Self::cancel) is a no-op on terminal tasks and works on idle ones
///   (the work then never runs).
/// - Receivers from [`subscribe`](Self::subscribe) see every committed transition
///   exactly once, in commit order.
#[async_trait]
pub trait ObservableTask: Send + Sync + 'static {
    type Success: Clone + Send + Sync + 'static;
    type Error: Clone + Send + Sync + 'static;

    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Identifier drawn from an [`IdRegistry`](crate::IdRegistry).
    fn id(&self) -> &TaskId;

    /// Current status snapshot.
    fn status(&self) -> TaskStatus<Self::Success, Self::Error>;

    /// Receiver of every subsequent transition, in order.
    fn subscribe(&self) -> broadcast::Receiver<TaskStatus<Self::Success, Self::Error>>;

    /// Receiver of the latest status.
    fn watch(&self) -> watch::Receiver<TaskStatus<Self::Success, Self::Error>>;

    /// Moves an idle task to active and begins its work.
    fn start(&self);

    /// Moves a non-terminal task to canceled and stops its work.
    fn cancel(&self);

    /// Suspends the task from the outside.
    fn pause(&self) -> Result<(), TaskError> {
        Err(TaskError::Unsupported { operation: "pause" })
    }

    /// Resumes a paused task from the outside.
    fn resume(&self) -> Result<(), TaskError> {
        Err(TaskError::Unsupported { operation: "resume" })
    }

    /// Resolves with the first terminal status.
    async fn wait(&self) -> TaskStatus<Self::Success, Self::Error> {
        let mut rx = self.watch();
        let terminal = rx.wait_for(TaskStatus::is_terminal).await.map(|s| s.clone());
        match terminal {
            Ok(status) => status,
            Err(_) => self.status(),
        }
    }
}

/// Object-safe view of an [`ObservableTask`] with the payload types erased.
pub(crate) trait ErasedTask: Send + Sync + 'static {
    fn name(&self) -> &str;
    fn id(&self) -> &TaskId;
    fn description(&self) -> TaskStatusDescription;
    fn start(&self);
    fn cancel(&self);
    fn wait(&self) -> BoxFuture<'_, TaskStatusDescription>;
}

impl<T> ErasedTask for T
where
    T: ObservableTask,
    T::Error: fmt::Display,
{
    fn name(&self) -> &str {
        ObservableTask::name(self)
    }

    fn id(&self) -> &TaskId {
        ObservableTask::id(self)
    }

    fn description(&self) -> TaskStatusDescription {
        ObservableTask::status(self).description()
    }

    fn start(&self) {
        ObservableTask::start(self)
    }

    fn cancel(&self) {
        ObservableTask::cancel(self)
    }

    fn wait(&self) -> BoxFuture<'_, TaskStatusDescription> {
        Box::pin(async move { ObservableTask::wait(self).await.description() })
    }
}
