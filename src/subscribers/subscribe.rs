//! # Subscribe: consumer side of the status event bus.
//!
//! A [`Subscribe`] implementation receives the [`Event`]s a
//! [`SubscriberSet`](crate::SubscriberSet) pulls off the [`Bus`](crate::Bus):
//! task transitions, group membership changes, and reports about other
//! subscribers.
//!
//! ```text
//! Bus ─► SubscriberSet ─► queue (queue_capacity) ─► worker ─► on_event(&Event)
//! ```
//!
//! Each implementation is fed by its own worker, one event at a time and in
//! bus order. Time spent in `on_event` only backs up that subscriber's queue;
//! once the queue is full its events are dropped and reported as
//! `SubscriberOverflow`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskflux::{Event, EventKind, Subscribe};
//!
//! struct Failures;
//!
//! #[async_trait]
//! impl Subscribe for Failures {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::StatusChanged
//!             && ev.to.as_ref().is_some_and(|s| s.is_failure())
//!         {
//!             // page someone...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of bus events, driven by a dedicated worker.
///
/// `on_event` may await freely but should not block the thread. A panic is
/// caught by the worker and turned into a `SubscriberPanicked` report.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Reacts to one event.
    async fn on_event(&self, event: &Event);

    /// Label used in log fields and in overflow/panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bound of this subscriber's queue; `0` is treated as `1`.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
