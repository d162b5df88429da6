//! # Type-erased status.
//!
//! [`TaskStatusDescription`] is what crosses task boundaries: events, task
//! groups and history all store it. The `Success` payload is dropped and the
//! `Error` payload is replaced by its rendered message ([`ErasedError`]).

use std::fmt;
use std::sync::Arc;

use super::status::TaskStatus;

/// Opaque error carried by [`TaskStatusDescription::Error`].
///
/// Holds the `Display` rendering of the original error. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErasedError(Arc<str>);

impl ErasedError {
    /// Captures the rendered message of `err`.
    pub fn new(err: &impl fmt::Display) -> Self {
        Self(Arc::from(err.to_string()))
    }

    /// Returns the captured message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErasedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErasedError {
    fn from(msg: &str) -> Self {
        Self(Arc::from(msg))
    }
}

/// Lossy projection of [`TaskStatus`].
///
/// # Example
/// ```
/// use taskflux::{TaskStatus, TaskStatusDescription};
///
/// let status: TaskStatus<u8, String> = TaskStatus::Error("disk full".into());
/// let desc = status.description();
/// assert!(desc.is_failure());
/// assert_eq!(desc.to_string(), "error: disk full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaskStatusDescription {
    #[default]
    Idle,
    Active,
    Paused,
    Canceled,
    Success,
    Error(ErasedError),
}

impl TaskStatusDescription {
    /// Active, paused or successful.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Active | Self::Paused | Self::Success)
    }

    /// Canceled or failed.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Canceled | Self::Error(_))
    }

    /// Terminal statuses only.
    #[inline]
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_) | Self::Canceled)
    }

    /// Alias of [`is_completion`](Self::is_completion).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.is_completion()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// `true` when both descriptions are the same variant, error messages ignored.
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Short stable name of the variant.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Canceled => "canceled",
            Self::Success => "success",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for TaskStatusDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "error: {err}"),
            other => f.write_str(other.as_label()),
        }
    }
}

impl<S, E: fmt::Display> From<&TaskStatus<S, E>> for TaskStatusDescription {
    fn from(status: &TaskStatus<S, E>) -> Self {
        match status {
            TaskStatus::Idle => Self::Idle,
            TaskStatus::Active => Self::Active,
            TaskStatus::Paused => Self::Paused,
            TaskStatus::Canceled => Self::Canceled,
            TaskStatus::Success(_) => Self::Success,
            TaskStatus::Error(err) => Self::Error(ErasedError::new(err)),
        }
    }
}
