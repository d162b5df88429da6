//! Status-change events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to erased status transitions of many tasks at once.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: every task built with `TaskBuilder::with_bus`, `TaskGroup`
//!   (insert/remove bookkeeping).
//! - **Consumers**: `SubscriberSet::spawn_listener` (fans out to subscribers such
//!   as `StatusHistory` and `LogWriter`), or any raw `Bus::subscribe` receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
