//! # Per-task status history with sequence-based ordering.
//!
//! Records the erased transitions of every task seen on the bus, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! PassthroughTask ──► Bus ──► SubscriberSet ──► StatusHistory::update()
//!                                                      │
//!                                                      ▼
//!                                        HashMap<TaskId, TaskRecord>
//!                                        (id → {last_seq, transitions})
//! ```
//!
//! ## Rules
//! - Only `StatusChanged` events carrying an id and a target status are recorded
//! - Events with `seq <= last_seq` for the same task are **rejected** (stale)
//! - At most `Config::history_limit` transitions are kept per task (oldest evicted)
//! - Read operations are **eventually consistent** with the tasks themselves

use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Subscribe;
use crate::config::Config;
use crate::events::{Event, EventKind};
use crate::ids::TaskId;
use crate::status::TaskStatusDescription;

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Sequence number of the event that reported it.
    pub seq: u64,
    /// Wall-clock time the event was created.
    pub at: SystemTime,
    pub from: Option<TaskStatusDescription>,
    pub to: TaskStatusDescription,
}

#[derive(Debug, Default)]
struct TaskRecord {
    last_seq: u64,
    transitions: VecDeque<Transition>,
}

/// Thread-safe recorder of task status transitions.
pub struct StatusHistory {
    state: RwLock<HashMap<TaskId, TaskRecord>>,
    limit: Option<usize>,
}

impl StatusHistory {
    /// Creates an empty history bounded by `limit` transitions per task (`None` = unbounded).
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
            limit,
        }
    }

    /// Creates a history bounded by [`Config::history_limit`].
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.history_limit())
    }

    /// Records the transition carried by `ev` if it is newer than the last one
    /// seen for the same task.
    ///
    /// ```text
    /// update(Active → Success, seq=100) → recorded, last_seq=100
    /// update(Idle → Active,    seq=99)  → rejected (stale)
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        if ev.kind != EventKind::StatusChanged {
            return false;
        }
        let (Some(id), Some(to)) = (&ev.id, &ev.to) else {
            return false;
        };

        let mut state = self.state.write().await;
        let record = state.entry(id.clone()).or_default();
        if !record.transitions.is_empty() && ev.seq <= record.last_seq {
            return false;
        }

        record.last_seq = ev.seq;
        record.transitions.push_back(Transition {
            seq: ev.seq,
            at: ev.at,
            from: ev.from.clone(),
            to: to.clone(),
        });
        if let Some(limit) = self.limit {
            while record.transitions.len() > limit {
                record.transitions.pop_front();
            }
        }
        true
    }

    /// Recorded transitions of `id`, oldest first.
    pub async fn history(&self, id: &TaskId) -> Vec<Transition> {
        self.state
            .read()
            .await
            .get(id)
            .map(|r| r.transitions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Last recorded status of `id`.
    pub async fn latest(&self, id: &TaskId) -> Option<TaskStatusDescription> {
        self.state
            .read()
            .await
            .get(id)
            .and_then(|r| r.transitions.back())
            .map(|t| t.to.clone())
    }

    /// Sorted ids of tasks whose last recorded status is not terminal.
    pub async fn active(&self) -> Vec<TaskId> {
        let state = self.state.read().await;
        let mut active: Vec<TaskId> = state
            .iter()
            .filter(|(_, r)| r.transitions.back().is_some_and(|t| !t.to.is_terminal()))
            .map(|(id, _)| id.clone())
            .collect();
        active.sort_unstable();
        active
    }

    /// Forgets everything recorded for `id`.
    pub async fn forget(&self, id: &TaskId) -> bool {
        self.state.write().await.remove(id).is_some()
    }
}

impl Default for StatusHistory {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[async_trait]
impl Subscribe for StatusHistory {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "status_history"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ids::IdRegistry;

    fn changed(id: &TaskId, from: TaskStatusDescription, to: TaskStatusDescription) -> Event {
        Event::status_changed(&Arc::from(id.key()), id, from, to)
    }

    #[tokio::test]
    async fn rejects_stale_events() {
        let ids = IdRegistry::new();
        let id = ids.next("t");
        let history = StatusHistory::new(None);

        let start = changed(&id, TaskStatusDescription::Idle, TaskStatusDescription::Active);
        let done = changed(&id, TaskStatusDescription::Active, TaskStatusDescription::Success);

        assert!(history.update(&done).await);
        assert!(!history.update(&start).await);
        assert_eq!(history.latest(&id).await, Some(TaskStatusDescription::Success));
        assert_eq!(history.history(&id).await.len(), 1);
    }

    #[tokio::test]
    async fn bounds_transitions_per_task() {
        let ids = IdRegistry::new();
        let id = ids.next("t");
        let history = StatusHistory::new(Some(2));

        for (from, to) in [
            (TaskStatusDescription::Idle, TaskStatusDescription::Active),
            (TaskStatusDescription::Active, TaskStatusDescription::Paused),
            (TaskStatusDescription::Paused, TaskStatusDescription::Active),
        ] {
            history.update(&changed(&id, from, to)).await;
        }

        let kept: Vec<_> = history.history(&id).await.into_iter().map(|t| t.to).collect();
        assert_eq!(kept, vec![TaskStatusDescription::Paused, TaskStatusDescription::Active]);
        assert_eq!(history.active().await, vec![id.clone()]);
        assert!(history.forget(&id).await);
        assert!(history.active().await.is_empty());
    }

    #[tokio::test]
    async fn ignores_other_events() {
        let history = StatusHistory::default();
        assert!(!history.update(&Event::new(EventKind::TaskAdded).with_task("x")).await);
        assert!(!history.update(&Event::new(EventKind::StatusChanged)).await);
    }
}
