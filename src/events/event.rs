//! # Events describing task status changes.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Status events**: a task committed a transition
//! - **Group events**: a task entered or left a [`TaskGroup`](crate::TaskGroup)
//! - **Subscriber events**: delivery problems inside a [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name and id, and the erased statuses on both sides of the transition.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! A task publishes while holding its status lock, so the `seq` order of one
//! task's `StatusChanged` events is its commit order.
//!
//! ## Example
//! ```rust
//! use taskflux::{Event, EventKind, TaskStatusDescription};
//!
//! let ev = Event::new(EventKind::StatusChanged)
//!     .with_task("upload")
//!     .with_from(TaskStatusDescription::Idle)
//!     .with_to(TaskStatusDescription::Active);
//!
//! assert_eq!(ev.kind, EventKind::StatusChanged);
//! assert_eq!(ev.task.as_deref(), Some("upload"));
//! assert_eq!(ev.to, Some(TaskStatusDescription::Active));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::ids::TaskId;
use crate::status::TaskStatusDescription;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Status events ===
    /// A task committed a status transition.
    ///
    /// Sets:
    /// - `task`, `id`: task name and id
    /// - `from`: status before the transition
    /// - `to`: status after the transition
    StatusChanged,

    // === Group events ===
    /// A task was inserted into a group.
    ///
    /// Sets:
    /// - `task`: debug rendering of the group key
    /// - `to`: status of the task at insertion
    TaskAdded,

    /// A task was removed from a group.
    ///
    /// Sets:
    /// - `task`: debug rendering of the group key
    /// - `to`: status of the task at removal
    TaskRemoved,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or group key, or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub id: Option<TaskId>,
    /// Status before the transition.
    pub from: Option<TaskStatusDescription>,
    /// Status after the transition.
    pub to: Option<TaskStatusDescription>,
    /// Human-readable reason (overflow details, panic message).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            id: None,
            from: None,
            to: None,
            reason: None,
        }
    }

    /// Creates a `StatusChanged` event for the given task.
    pub fn status_changed(
        task: &Arc<str>,
        id: &TaskId,
        from: TaskStatusDescription,
        to: TaskStatusDescription,
    ) -> Self {
        Event::new(EventKind::StatusChanged)
            .with_task(Arc::clone(task))
            .with_id(id.clone())
            .with_from(from)
            .with_to(to)
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches the status before the transition.
    #[inline]
    pub fn with_from(mut self, from: TaskStatusDescription) -> Self {
        self.from = Some(from);
        self
    }

    /// Attaches the status after the transition.
    #[inline]
    pub fn with_to(mut self, to: TaskStatusDescription) -> Self {
        self.to = Some(to);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// `true` for a `StatusChanged` event that landed on a terminal status.
    #[inline]
    pub fn is_completion(&self) -> bool {
        self.kind == EventKind::StatusChanged
            && self.to.as_ref().is_some_and(TaskStatusDescription::is_completion)
    }
}
