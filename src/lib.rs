//! # taskflux
//!
//! **Taskflux** is a small library of observable tasks and backpressure-aware
//! stream operators.
//!
//! It provides a status state machine shared by every task, a task type whose
//! body reports its own outcome with a race-free status commit, and a reusable
//! operator core that never sends downstream more than it asked for.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//!     │ PassthroughTask │   │ PassthroughTask │   │  custom task    │
//!     │  (sync body)    │   │ (tokio future)  │   │ (ObservableTask)│
//!     └───────┬─────────┘   └───────┬─────────┘   └───────┬─────────┘
//!             │ status lock: commit + notify in one step  │
//!             ├──► broadcast::Receiver<TaskStatus<S, E>>  (per task, ordered)
//!             ├──► watch::Receiver<TaskStatus<S, E>>      (latest, wait())
//!             ▼                                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                Bus (broadcast of erased StatusChanged events)     │
//! │                     (capacity: Config::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                      SubscriberSet::spawn_listener
//!                          ┌────────┼─────────┐
//!                          ▼        ▼         ▼
//!                  StatusHistory  LogWriter  custom Subscribe
//!
//!   TaskGroup<K> ── owns AnyTask (type-erased) ── insert / start_all / cancel_all
//! ```
//!
//! ### Operators
//! ```text
//! upstream Publisher ──► OperatorBase<O> ──► downstream Subscriber
//!        ▲  request(UpstreamDemand)   │ pop_value() while demand > 0
//!        └────────────────────────────┘ completion only once all values are sent
//! ```
//!
//! ## Features
//! | Area           | Description                                               | Key types / traits                                |
//! |----------------|-----------------------------------------------------------|---------------------------------------------------|
//! | **Status**     | Lifecycle state machine and its erased projection.        | [`TaskStatus`], [`TaskStatusDescription`]         |
//! | **Tasks**      | Single-shot observable tasks and keyed groups of them.    | [`ObservableTask`], [`PassthroughTask`], [`TaskGroup`] |
//! | **Operators**  | Demand-driven one-to-many stream operators.               | [`Operator`], [`OperatorBase`], [`Demand`]        |
//! | **Events**     | Crate-wide status events and fan-out to subscribers.      | [`Bus`], [`Event`], [`Subscribe`]                 |
//! | **Errors**     | Typed rejections for task requests.                       | [`TaskError`], [`OperatorError`]                  |
//! | **Configuration** | Channel capacities and history bounds.                 | [`Config`]                                        |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use taskflux::{Bus, PassthroughTask, TaskBuilder, TaskGroup, TaskStatus, TaskStatusDescription};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = Bus::default();
//!     let mut events = bus.subscribe();
//!
//!     let upload: PassthroughTask<u64, String> = TaskBuilder::new("upload")
//!         .with_bus(bus.clone())
//!         .spawn(|token| async move {
//!             if token.is_cancelled() {
//!                 return Err("canceled".to_string());
//!             }
//!             Ok(1024)
//!         });
//!
//!     let group = TaskGroup::with_bus(bus);
//!     group.insert("upload", upload.clone()).unwrap();
//!     group.start_all();
//!
//!     assert_eq!(upload.wait().await, TaskStatus::Success(1024));
//!     assert_eq!(group.statuses()["upload"], TaskStatusDescription::Success);
//!     assert!(events.recv().await.is_ok());
//! }
//! ```
mod config;
mod error;
mod events;
mod ids;
mod operator;
mod status;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{OperatorError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use ids::{IdRegistry, TaskId};
pub use operator::{
    Buffer, BufferOperator, Completion, Demand, Expand, ExpandOperator, FailurePolicy, Operator,
    OperatorBase, Publisher, PublisherExt, Sequence, Subscriber, Subscription, UpstreamDemand,
};
pub use status::{ErasedError, TaskStatus, TaskStatusDescription};
pub use subscribers::{StatusHistory, Subscribe, SubscriberSet, Transition};
pub use tasks::{
    AnyTask, Cancellable, ObservableTask, OnCancel, PassthroughTask, TaskBuilder, TaskGroup,
    TaskHandle,
};

// Optional: expose a built-in logging subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
