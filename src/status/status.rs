//! # Typed task status.
//!
//! [`TaskStatus`] is the closed set of lifecycle states a task can be in,
//! carrying the task's `Success` value or `Error` payload once it finishes.

use std::fmt;

use super::description::TaskStatusDescription;

/// Lifecycle state of a task.
///
/// Exactly one variant holds at any instant. See the [module docs](crate::status)
/// for the allowed transitions.
///
/// # Example
/// ```
/// use taskflux::TaskStatus;
///
/// let status: TaskStatus<u32, String> = TaskStatus::Success(42);
/// assert!(status.is_terminal());
/// assert_eq!(status.map(|v| v * 2), TaskStatus::Success(84));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus<S, E> {
    /// Created, not yet started.
    #[default]
    Idle,
    /// Started and running its work.
    Active,
    /// Started, but the work reported it is suspended.
    Paused,
    /// Stopped before producing a result.
    Canceled,
    /// Finished with a value.
    Success(S),
    /// Finished with an application error.
    Error(E),
}

impl<S, E> TaskStatus<S, E> {
    /// `true` for [`TaskStatus::Idle`].
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, TaskStatus::Idle)
    }

    /// `true` for [`TaskStatus::Active`].
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Active)
    }

    /// `true` for [`TaskStatus::Paused`].
    #[inline]
    pub fn is_paused(&self) -> bool {
        matches!(self, TaskStatus::Paused)
    }

    /// `true` for [`TaskStatus::Canceled`].
    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskStatus::Canceled)
    }

    /// `true` once the task has started and not yet finished.
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, TaskStatus::Active | TaskStatus::Paused)
    }

    /// `true` for statuses nothing can transition out of.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success(_) | TaskStatus::Error(_) | TaskStatus::Canceled
        )
    }

    /// Alias of [`is_terminal`](Self::is_terminal).
    #[inline]
    pub fn is_completion(&self) -> bool {
        self.is_terminal()
    }

    /// `true` for statuses that belong to a task producing output:
    /// active, paused or successful.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            TaskStatus::Active | TaskStatus::Paused | TaskStatus::Success(_)
        )
    }

    /// `true` for canceled or failed tasks.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Canceled | TaskStatus::Error(_))
    }

    /// Returns the success value, if any.
    pub fn success(&self) -> Option<&S> {
        match self {
            TaskStatus::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the error payload, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            TaskStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Converts a terminal `Success`/`Error` into a `Result`.
    ///
    /// Returns `None` for every other status, `Canceled` included.
    pub fn into_result(self) -> Option<Result<S, E>> {
        match self {
            TaskStatus::Success(value) => Some(Ok(value)),
            TaskStatus::Error(err) => Some(Err(err)),
            _ => None,
        }
    }

    /// Borrows the payloads.
    pub fn as_ref(&self) -> TaskStatus<&S, &E> {
        match self {
            TaskStatus::Idle => TaskStatus::Idle,
            TaskStatus::Active => TaskStatus::Active,
            TaskStatus::Paused => TaskStatus::Paused,
            TaskStatus::Canceled => TaskStatus::Canceled,
            TaskStatus::Success(value) => TaskStatus::Success(value),
            TaskStatus::Error(err) => TaskStatus::Error(err),
        }
    }

    /// Transforms the success value, leaving every other status as is.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> TaskStatus<T, E> {
        match self {
            TaskStatus::Idle => TaskStatus::Idle,
            TaskStatus::Active => TaskStatus::Active,
            TaskStatus::Paused => TaskStatus::Paused,
            TaskStatus::Canceled => TaskStatus::Canceled,
            TaskStatus::Success(value) => TaskStatus::Success(f(value)),
            TaskStatus::Error(err) => TaskStatus::Error(err),
        }
    }

    /// Transforms the error payload, leaving every other status as is.
    pub fn map_error<F>(self, f: impl FnOnce(E) -> F) -> TaskStatus<S, F> {
        match self {
            TaskStatus::Idle => TaskStatus::Idle,
            TaskStatus::Active => TaskStatus::Active,
            TaskStatus::Paused => TaskStatus::Paused,
            TaskStatus::Canceled => TaskStatus::Canceled,
            TaskStatus::Success(value) => TaskStatus::Success(value),
            TaskStatus::Error(err) => TaskStatus::Error(f(err)),
        }
    }

    /// `true` when both statuses are the same variant, payloads ignored.
    pub fn same_kind<T, F>(&self, other: &TaskStatus<T, F>) -> bool {
        matches!(
            (self, other),
            (TaskStatus::Idle, TaskStatus::Idle)
                | (TaskStatus::Active, TaskStatus::Active)
                | (TaskStatus::Paused, TaskStatus::Paused)
                | (TaskStatus::Canceled, TaskStatus::Canceled)
                | (TaskStatus::Success(_), TaskStatus::Success(_))
                | (TaskStatus::Error(_), TaskStatus::Error(_))
        )
    }
}

impl<S, E: fmt::Display> TaskStatus<S, E> {
    /// Erases the payload types.
    pub fn description(&self) -> TaskStatusDescription {
        TaskStatusDescription::from(self)
    }
}

impl<S, E> From<Result<S, E>> for TaskStatus<S, E> {
    fn from(result: Result<S, E>) -> Self {
        match result {
            Ok(value) => TaskStatus::Success(value),
            Err(err) => TaskStatus::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Status = TaskStatus<u32, String>;

    #[test]
    fn terminal_variants() {
        assert!(!Status::Idle.is_terminal());
        assert!(!Status::Active.is_terminal());
        assert!(!Status::Paused.is_terminal());
        assert!(Status::Canceled.is_terminal());
        assert!(Status::Success(1).is_terminal());
        assert!(Status::Error("boom".into()).is_terminal());
    }

    #[test]
    fn output_and_failure_predicates() {
        assert!(Status::Active.is_output());
        assert!(Status::Paused.is_output());
        assert!(Status::Success(1).is_output());
        assert!(!Status::Idle.is_output());

        assert!(Status::Canceled.is_failure());
        assert!(Status::Error("x".into()).is_failure());
        assert!(!Status::Success(1).is_failure());
    }

    #[test]
    fn map_touches_only_its_payload() {
        assert_eq!(Status::Success(2).map(|v| v + 1), TaskStatus::Success(3));
        assert_eq!(
            Status::Error("e".into()).map(|v| v + 1),
            TaskStatus::<u32, String>::Error("e".into())
        );
        assert_eq!(
            Status::Error("e".into()).map_error(|e| e.len()),
            TaskStatus::<u32, usize>::Error(1)
        );
        assert_eq!(Status::Paused.map_error(|e| e.len()), TaskStatus::Paused);
    }

    #[test]
    fn same_kind_ignores_payload() {
        assert!(Status::Success(1).same_kind(&Status::Success(2)));
        assert!(Status::Error("a".into()).same_kind(&TaskStatus::<(), u8>::Error(0)));
        assert!(!Status::Active.same_kind(&Status::Paused));
    }

    #[test]
    fn from_result() {
        assert_eq!(Status::from(Ok(5)), TaskStatus::Success(5));
        assert_eq!(
            Status::from(Err("nope".to_string())).into_result(),
            Some(Err("nope".to_string()))
        );
        assert_eq!(Status::Canceled.into_result(), None);
    }
}
