use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::cancellable::Cancellable;
use super::passthrough::{PassthroughTask, TaskHandle, async_body, sync_body};
use crate::config::Config;
use crate::events::Bus;
use crate::ids::IdRegistry;

/// Builder for [`PassthroughTask`] with fluent API
#[derive(Clone)]
pub struct TaskBuilder {
    name: Cow<'static, str>,
    bus: Option<Bus>,
    ids: Option<Arc<IdRegistry>>,
    status_capacity: usize,
}

impl TaskBuilder {
    /// Creates a new builder with the given task name
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            bus: None,
            ids: None,
            status_capacity: Config::default().status_capacity_clamped(),
        }
    }

    /// Publishes every status change of the built task to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Draws the task id from `ids` instead of [`IdRegistry::shared`].
    pub fn with_ids(mut self, ids: Arc<IdRegistry>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.status_capacity = config.status_capacity_clamped();
        self
    }

    /// Build a task from a body receiving its [`TaskHandle`]
    pub fn build<S, E, F, W>(self, body: F) -> PassthroughTask<S, E>
    where
        S: Clone + Send + Sync + 'static,
        E: Clone + fmt::Display + Send + Sync + 'static,
        F: FnOnce(TaskHandle<S, E>) -> W + Send + 'static,
        W: Cancellable,
    {
        let ids = self.ids.unwrap_or_else(IdRegistry::shared);
        let id = ids.next(&self.name);
        let name: Arc<str> = Arc::from(self.name.as_ref());
        PassthroughTask::from_parts(
            name,
            id,
            self.status_capacity,
            self.bus,
            Box::new(move |handle| Box::new(body(handle)) as Box<dyn Cancellable>),
        )
    }

    /// Build a task evaluating `f` synchronously inside `start`
    pub fn build_fn<S, E, F>(self, f: F) -> PassthroughTask<S, E>
    where
        S: Clone + Send + Sync + 'static,
        E: Clone + fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> Result<S, E> + Send + 'static,
    {
        self.build(sync_body(f))
    }

    /// Build a task driving the future returned by `f` on the current Tokio runtime
    pub fn spawn<S, E, F, Fut>(self, f: F) -> PassthroughTask<S, E>
    where
        S: Clone + Send + Sync + 'static,
        E: Clone + fmt::Display + Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, E>> + Send + 'static,
    {
        self.build(async_body(f))
    }
}
