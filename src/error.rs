//! Error types used by tasks, task groups and operators.
//!
//! This module defines two error enums:
//!
//! - [`TaskError`]: a request against a task (or a group of tasks) was rejected.
//! - [`OperatorError`]: an [`Operator`](crate::Operator) implementation broke its contract.
//!
//! A running task never reports failure through these types: its own outcome
//! lives in [`TaskStatus`](crate::TaskStatus). `TaskError` only tells the caller
//! that *their* request was dropped and the status cell was left untouched.

use thiserror::Error;

use crate::status::TaskStatusDescription;

/// # Rejected task requests.
///
/// Returned by [`TaskHandle`](crate::TaskHandle) mutators and by
/// [`TaskGroup`](crate::TaskGroup) operations. None of these variants ever
/// changes a task status.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task already reached a terminal status; further transitions are dropped.
    #[error("task already finished with status {status}")]
    AlreadyTerminal {
        /// The terminal status the task holds.
        status: TaskStatusDescription,
    },

    /// The transition needs a running task, but the task was never started.
    #[error("task has not been started")]
    NotStarted,

    /// The task type does not implement the requested operation.
    #[error("operation not supported: {operation}")]
    Unsupported {
        /// Name of the rejected operation (`pause`, `resume`, ...).
        operation: &'static str,
    },

    /// An async body was started outside of a Tokio runtime.
    #[error("no tokio runtime available to drive the task body")]
    NoRuntime,

    /// A task group already holds an entry under this key.
    #[error("duplicate task key: {key}")]
    DuplicateKey {
        /// Debug rendering of the rejected key.
        key: String,
    },

    /// A task group holds no entry under this key.
    #[error("no task under key: {key}")]
    NotFound {
        /// Debug rendering of the missing key.
        key: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskflux::TaskError;
    ///
    /// let err = TaskError::Unsupported { operation: "pause" };
    /// assert_eq!(err.as_label(), "task_unsupported");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AlreadyTerminal { .. } => "task_already_terminal",
            TaskError::NotStarted => "task_not_started",
            TaskError::Unsupported { .. } => "task_unsupported",
            TaskError::NoRuntime => "task_no_runtime",
            TaskError::DuplicateKey { .. } => "group_duplicate_key",
            TaskError::NotFound { .. } => "group_not_found",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::AlreadyTerminal { status } => format!("already terminal: {status}"),
            TaskError::NotStarted => "not started".to_string(),
            TaskError::Unsupported { operation } => format!("unsupported: {operation}"),
            TaskError::NoRuntime => "no runtime".to_string(),
            TaskError::DuplicateKey { key } => format!("duplicate key: {key}"),
            TaskError::NotFound { key } => format!("not found: {key}"),
        }
    }
}

/// # Operator contract violations.
///
/// These are programmer errors inside an [`Operator`](crate::Operator)
/// implementation. [`OperatorBase`](crate::OperatorBase) panics with the
/// rendered message; they are never delivered downstream.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorError {
    /// `pop_value` returned nothing after upstream completed, yet the operator
    /// still claims to hold unsent values.
    #[error("operator has no value to pop but reports unsent values after upstream completion")]
    UnsentValuesAfterCompletion,

    /// Completion was about to be delivered downstream a second time.
    #[error("completion already delivered downstream")]
    CompletionDeliveredTwice,
}

impl OperatorError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            OperatorError::UnsentValuesAfterCompletion => "operator_unsent_values",
            OperatorError::CompletionDeliveredTwice => "operator_double_completion",
        }
    }
}
