//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and built-in implementations for handling events published on the
//! [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   PassthroughTask ── publish(Event) ──► Bus ──► SubscriberSet::spawn_listener
//!   TaskGroup       ──┘                                │
//!                                                      ├──► [queue] ─► StatusHistory
//!                                                      ├──► [queue] ─► LogWriter
//!                                                      └──► [queue] ─► Custom ...
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, metrics, alerts)
//! - **Stateful subscribers** - maintain internal state based on events (StatusHistory)

mod history;
#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

pub use history::{StatusHistory, Transition};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
