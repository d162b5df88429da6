use std::fmt;
use std::sync::Arc;

use super::cancellable::Cancellable;
use super::passthrough::PassthroughTask;
use super::task::{ErasedTask, ObservableTask};
use crate::ids::TaskId;
use crate::status::TaskStatusDescription;

/// Shared, type-erased reference to any [`ObservableTask`].
///
/// Statuses surface as [`TaskStatusDescription`] so tasks with different
/// success and error types can live side by side in a [`TaskGroup`](crate::TaskGroup).
#[derive(Clone)]
pub struct AnyTask {
    inner: Arc<dyn ErasedTask>,
}

impl AnyTask {
    pub fn new<T>(task: T) -> Self
    where
        T: ObservableTask,
        T::Error: fmt::Display,
    {
        Self {
            inner: Arc::new(task),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn id(&self) -> &TaskId {
        self.inner.id()
    }

    /// Current status with the payloads erased.
    pub fn description(&self) -> TaskStatusDescription {
        self.inner.description()
    }

    pub fn is_terminal(&self) -> bool {
        self.description().is_terminal()
    }

    pub fn start(&self) {
        self.inner.start();
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Resolves with the first terminal status.
    pub async fn wait(&self) -> TaskStatusDescription {
        self.inner.wait().await
    }
}

impl fmt::Debug for AnyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyTask")
            .field("name", &self.name())
            .field("id", self.id())
            .field("status", &self.description())
            .finish()
    }
}

impl Cancellable for AnyTask {
    fn cancel(&self) {
        AnyTask::cancel(self);
    }
}

impl<S, E> From<PassthroughTask<S, E>> for AnyTask
where
    S: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    fn from(task: PassthroughTask<S, E>) -> Self {
        AnyTask::new(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn erases_payload_types() {
        let ok = AnyTask::from(PassthroughTask::<u32, String>::from_fn("ok", || Ok(1)));
        let bad = AnyTask::from(PassthroughTask::<(), &'static str>::from_fn("bad", || Err("disk")));
        assert_eq!(ok.description(), TaskStatusDescription::Idle);

        ok.start();
        bad.start();
        assert_eq!(ok.wait().await, TaskStatusDescription::Success);
        assert_eq!(bad.description(), TaskStatusDescription::Error("disk".into()));
        assert!(bad.is_terminal());
    }

    #[test]
    fn clones_share_the_task() {
        let task = AnyTask::from(PassthroughTask::<u32, String>::new("idle", |_h| ()));
        let other = task.clone();
        other.cancel();
        assert_eq!(task.description(), TaskStatusDescription::Canceled);
        assert_eq!(task.id(), other.id());
    }
}
