//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught, logged and published as
//!   `SubscriberPanicked` (isolation). A subscriber never receives reports of
//!   its own panics, and a panic on a panic report is not re-published.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for that
//!   subscriber and `SubscriberOverflow` is published).
//!
//! ## Diagram
//! ```text
//!   Bus ──► spawn_listener ──► emit(&Event)
//!                                 │          (Arc-clone per subscriber)
//!                                 ├────────► [queue S1] ─► worker S1 ─► on_event()
//!                                 ├────────► [queue S2] ─► worker S2 ─► on_event()
//!                                 └────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::Subscribe;
use crate::events::{Bus, Event, EventKind};

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Builds the set, giving every subscriber its own queue and worker task.
    ///
    /// Needs a Tokio runtime. Overflow and panic reports go to `bus`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (channels, workers) = subs
            .into_iter()
            .map(|sub| {
                let (sender, queue) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
                let channel = SubscriberChannel {
                    name: sub.name(),
                    sender,
                };
                (channel, tokio::spawn(run_worker(sub, queue, bus.clone())))
            })
            .unzip();

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped for it
    /// and `SubscriberOverflow` is published, unless the dropped event is itself
    /// an overflow report.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        let is_overflow_evt = matches!(ev.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            if is_own_panic_report(&ev, channel.name) {
                continue;
            }
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = channel.name, reason, seq = ev.seq, "subscriber dropped event");
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Forwards every event published on the set's bus to its subscribers until
    /// `token` is cancelled or the bus closes, then shuts the set down.
    ///
    /// Awaiting the returned handle waits for every subscriber to drain its queue.
    pub fn spawn_listener(self, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => self.emit(&ev),
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                        }
                    }
                }
            }
            self.shutdown().await;
        })
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

/// Feeds one subscriber from its queue until the queue closes.
///
/// A panic while handling a `SubscriberPanicked` event is only logged, so a
/// subscriber that always panics cannot keep re-feeding itself through the bus.
async fn run_worker(sub: Arc<dyn Subscribe>, mut queue: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = queue.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        let Err(payload) = handled else {
            continue;
        };
        let info = panic_message(payload.as_ref());
        tracing::warn!(subscriber = sub.name(), %info, seq = ev.seq, "subscriber panicked");
        if ev.kind != EventKind::SubscriberPanicked {
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

/// `true` when `ev` reports a panic of the subscriber named `name`.
fn is_own_panic_report(ev: &Event, name: &str) -> bool {
    ev.kind == EventKind::SubscriberPanicked && ev.task.as_deref() == Some(name)
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
