//! # Task status model.
//!
//! Every task-like object in this crate reports its lifecycle through
//! [`TaskStatus`]. The [`TaskStatusDescription`] projection drops the payload
//! types so statuses of unrelated tasks can be compared, stored and logged.
//!
//! ## State machine
//! ```text
//!            start()            succeed(v)
//!   Idle ───────────► Active ─────────────► Success(v)
//!     │                │ ▲   fail(e)
//!     │        pause() │ │ resume()  ─────► Error(e)
//!     │                ▼ │
//!     │               Paused
//!     │                          cancel()
//!     └──────────────── (any non-terminal) ─► Canceled
//! ```
//!
//! ## Rules
//! - `Success`, `Error` and `Canceled` are terminal; nothing leaves them.
//! - Nothing ever re-enters `Idle`.
//! - A transition to the *same kind* of status is dropped (`Success(1)` → `Success(2)` included).

mod description;
mod status;

pub use description::{ErasedError, TaskStatusDescription};
pub use status::TaskStatus;
