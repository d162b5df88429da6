//! # TaskGroup: keyed collection of tasks.
//!
//! A group owns [`AnyTask`] references under unique keys and offers bulk
//! operations over them.
//!
//! ## Architecture
//! ```text
//! insert(key, task) ──► [RwLock<HashMap<K, AnyTask>>] ──► TaskAdded   (bus)
//! remove(key)       ──► take entry                    ──► TaskRemoved (bus)
//! start_all()       ──► snapshot ─► unlock ─► task.start() for each
//! cancel_all()      ──► snapshot ─► unlock ─► task.cancel() for each
//! ```
//!
//! ## Rules
//! - Keys are unique: a second `insert` under the same key is rejected.
//! - The map lock is never held while calling into a task, so bodies may
//!   freely touch the group that owns them.
//! - `remove` does not cancel; callers decide what happens to the task.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use futures::future::join_all;
use parking_lot::RwLock;

use super::any::AnyTask;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::status::TaskStatusDescription;

/// Keyed set of heterogeneous tasks.
pub struct TaskGroup<K> {
    tasks: RwLock<HashMap<K, AnyTask>>,
    bus: Option<Bus>,
}

impl<K> Default for TaskGroup<K> {
    fn default() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            bus: None,
        }
    }
}

impl<K> TaskGroup<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a group that reports membership changes on `bus`.
    pub fn with_bus(bus: Bus) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            bus: Some(bus),
        }
    }

    /// Adds `task` under `key`.
    ///
    /// Returns [`TaskError::DuplicateKey`] if the key is taken; the existing
    /// entry is left untouched and `task` is dropped.
    pub fn insert(&self, key: K, task: impl Into<AnyTask>) -> Result<(), TaskError> {
        let task = task.into();
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&key) {
            return Err(TaskError::DuplicateKey {
                key: format!("{key:?}"),
            });
        }
        let status = task.description();
        tasks.insert(key.clone(), task);
        drop(tasks);

        tracing::debug!(key = ?key, %status, "task added");
        self.publish(EventKind::TaskAdded, &key, status);
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<AnyTask> {
        self.tasks.read().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.tasks.read().contains_key(key)
    }

    /// Starts the task under `key`.
    pub fn start(&self, key: &K) -> Result<(), TaskError> {
        self.lookup(key)?.start();
        Ok(())
    }

    /// Cancels the task under `key`.
    pub fn cancel(&self, key: &K) -> Result<(), TaskError> {
        self.lookup(key)?.cancel();
        Ok(())
    }

    pub fn start_all(&self) {
        for task in self.snapshot() {
            task.start();
        }
    }

    pub fn cancel_all(&self) {
        for task in self.snapshot() {
            task.cancel();
        }
    }

    /// Takes the task under `key` out of the group without cancelling it.
    pub fn remove(&self, key: &K) -> Option<AnyTask> {
        let task = self.tasks.write().remove(key)?;
        let status = task.description();
        tracing::debug!(key = ?key, %status, "task removed");
        self.publish(EventKind::TaskRemoved, key, status);
        Some(task)
    }

    /// Removes every finished task and returns how many were dropped.
    pub fn prune_finished(&self) -> usize {
        let finished: Vec<K> = self
            .entries()
            .into_iter()
            .filter(|(_, task)| task.is_terminal())
            .map(|(key, _)| key)
            .collect();
        finished
            .iter()
            .filter(|key| self.remove(key).is_some())
            .count()
    }

    /// Snapshot of every task status, keyed like the group.
    pub fn statuses(&self) -> HashMap<K, TaskStatusDescription> {
        self.entries()
            .into_iter()
            .map(|(key, task)| (key, task.description()))
            .collect()
    }

    /// Waits until every task currently in the group reaches a terminal status.
    pub async fn wait_all(&self) -> HashMap<K, TaskStatusDescription> {
        let entries = self.entries();
        let results = join_all(entries.iter().map(|(_, task)| task.wait())).await;
        entries
            .into_iter()
            .map(|(key, _)| key)
            .zip(results)
            .collect()
    }

    pub fn keys(&self) -> Vec<K> {
        self.tasks.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    fn lookup(&self, key: &K) -> Result<AnyTask, TaskError> {
        self.get(key).ok_or_else(|| TaskError::NotFound {
            key: format!("{key:?}"),
        })
    }

    fn snapshot(&self) -> Vec<AnyTask> {
        self.tasks.read().values().cloned().collect()
    }

    fn entries(&self) -> Vec<(K, AnyTask)> {
        self.tasks
            .read()
            .iter()
            .map(|(k, t)| (k.clone(), t.clone()))
            .collect()
    }

    fn publish(&self, kind: EventKind, key: &K, status: TaskStatusDescription) {
        if let Some(bus) = &self.bus {
            bus.publish(
                Event::new(kind)
                    .with_task(format!("{key:?}"))
                    .with_to(status),
            );
        }
    }
}

impl<K> fmt::Debug for TaskGroup<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tasks.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tasks::PassthroughTask;

    fn ok(name: &'static str, value: u32) -> PassthroughTask<u32, String> {
        PassthroughTask::from_fn(name, move || Ok(value))
    }

    #[test]
    fn rejects_duplicate_keys() {
        let group = TaskGroup::new();
        group.insert("a", ok("a", 1)).unwrap();
        let err = group.insert("a", ok("a", 2)).unwrap_err();
        assert_eq!(err, TaskError::DuplicateKey { key: "\"a\"".into() });
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn missing_key_is_reported() {
        let group: TaskGroup<u8> = TaskGroup::new();
        assert_eq!(group.start(&7), Err(TaskError::NotFound { key: "7".into() }));
        assert_eq!(group.cancel(&7).unwrap_err().as_label(), "group_not_found");
    }

    #[test]
    fn bulk_start_and_prune() {
        let group = TaskGroup::new();
        group.insert(1, ok("one", 1)).unwrap();
        group.insert(2, ok("two", 2)).unwrap();
        group
            .insert(3, PassthroughTask::<u32, String>::new("pending", |_h| ()))
            .unwrap();

        group.start_all();
        let statuses = group.statuses();
        assert_eq!(statuses[&1], TaskStatusDescription::Success);
        assert_eq!(statuses[&3], TaskStatusDescription::Active);

        assert_eq!(group.prune_finished(), 2);
        assert_eq!(group.keys(), vec![3]);

        group.cancel_all();
        assert_eq!(group.get(&3).unwrap().description(), TaskStatusDescription::Canceled);
    }

    #[test]
    fn remove_does_not_cancel() {
        let group = TaskGroup::new();
        group
            .insert("idle", PassthroughTask::<u32, String>::new("idle", |_h| ()))
            .unwrap();
        let task = group.remove(&"idle").unwrap();
        assert!(group.is_empty());
        assert_eq!(task.description(), TaskStatusDescription::Idle);
        assert!(group.remove(&"idle").is_none());
    }

    #[test]
    fn body_may_touch_its_own_group() {
        let group: Arc<TaskGroup<&'static str>> = Arc::new(TaskGroup::new());
        let inner = Arc::clone(&group);
        group
            .insert(
                "self",
                PassthroughTask::<u32, String>::new("self", move |_h| {
                    inner.cancel(&"self").unwrap();
                }),
            )
            .unwrap();
        group.start(&"self").unwrap();
        assert_eq!(group.statuses()[&"self"], TaskStatusDescription::Canceled);
    }

    #[test]
    fn publishes_membership_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let group = TaskGroup::with_bus(bus);
        group.insert("k", ok("k", 1)).unwrap();
        group.remove(&"k");

        let added = rx.try_recv().unwrap();
        let removed = rx.try_recv().unwrap();
        assert_eq!(added.kind, EventKind::TaskAdded);
        assert_eq!(added.to, Some(TaskStatusDescription::Idle));
        assert_eq!(removed.kind, EventKind::TaskRemoved);
        assert_eq!(removed.task.as_deref(), Some("\"k\""));
    }

    #[tokio::test]
    async fn wait_all_collects_terminal_statuses() {
        let group = TaskGroup::new();
        group.insert("x", ok("x", 1)).unwrap();
        group
            .insert(
                "y",
                PassthroughTask::<u32, String>::spawn("y", |_t| async { Err("bad".to_string()) }),
            )
            .unwrap();
        group.start_all();

        let done = group.wait_all().await;
        assert_eq!(done[&"x"], TaskStatusDescription::Success);
        assert_eq!(done[&"y"], TaskStatusDescription::Error("bad".into()));
    }
}
