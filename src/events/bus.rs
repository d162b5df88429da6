//! # Event bus for broadcasting status changes.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from many tasks.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Receivers (any number):
//!   Task 1 ──┐
//!   Task 2 ──┼──────► Bus ───────► SubscriberSet listener ──► subscribers
//!   Task N ──┤  (broadcast chan)  └► raw Bus::subscribe() receivers
//!   Group  ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks, so tasks may publish while
//!   holding their status lock.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;
use crate::config::Config;

/// Broadcast channel for status-change events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Creates a bus sized by [`Config::bus_capacity`].
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.bus_capacity_clamped())
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::status::TaskStatusDescription;

    #[tokio::test]
    async fn delivers_to_every_receiver() {
        let bus = Bus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::new(EventKind::TaskRemoved).with_task("t"));

        assert_eq!(a.recv().await.unwrap().kind, EventKind::TaskRemoved);
        assert_eq!(b.recv().await.unwrap().task.as_deref(), Some("t"));
    }

    #[test]
    fn publish_without_receivers_is_dropped() {
        let bus = Bus::new(0);
        assert_eq!(bus.receiver_count(), 0);
        bus.publish(Event::new(EventKind::StatusChanged).with_to(TaskStatusDescription::Active));
    }
}
