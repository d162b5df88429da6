//! # Observable tasks.
//!
//! This module provides the task-related types:
//! - [`ObservableTask`] - trait every task type implements (status, notifications, start/cancel)
//! - [`PassthroughTask`] - task driven by a closure that reports its own outcome
//! - [`TaskHandle`] - the body's side of a `PassthroughTask`
//! - [`TaskBuilder`] - fluent construction with ids, bus and config
//! - [`Cancellable`] - work handle stopped when a task is canceled
//! - [`AnyTask`] - shared, type-erased task reference
//! - [`TaskGroup`] - keyed collection of `AnyTask`s with bulk operations

mod any;
mod builder;
mod cancellable;
mod group;
mod passthrough;
mod task;

pub use any::AnyTask;
pub use builder::TaskBuilder;
pub use cancellable::{Cancellable, OnCancel};
pub use group::TaskGroup;
pub use passthrough::{PassthroughTask, TaskHandle};
pub use task::ObservableTask;
