//! # Logging subscriber for debugging and demos.
//!
//! [`LogWriter`] turns bus events into `tracing` records at `info` level
//! (subscriber problems at `warn`).
//!
//! ## Output format (fmt layer)
//! ```text
//! INFO taskflux: status task=upload id=upload#0 from=idle to=active seq=12
//! INFO taskflux: status task=upload id=upload#0 from=active to=error: timed out seq=13
//! INFO taskflux: group task="upload" status=idle event=added
//! WARN taskflux: subscriber subscriber=history reason=subscriber=history reason=full
//! ```
//!
//! ## Example
//! ```no_run
//! # async fn demo() {
//! use std::sync::Arc;
//! use taskflux::{Bus, LogWriter, Subscribe, SubscriberSet};
//! use tokio_util::sync::CancellationToken;
//!
//! let bus = Bus::default();
//! let set = SubscriberSet::new(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>], bus.clone());
//! let listener = set.spawn_listener(CancellationToken::new());
//! # let _ = listener;
//! # }
//! ```

use async_trait::async_trait;

use super::Subscribe;
use crate::events::{Event, EventKind};

/// `tracing`-backed logging subscriber.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::StatusChanged => {
                let id = e.id.as_ref().map(ToString::to_string).unwrap_or_default();
                let from = e.from.as_ref().map(ToString::to_string).unwrap_or_default();
                let to = e.to.as_ref().map(ToString::to_string).unwrap_or_default();
                tracing::info!(task, id = %id, from = %from, to = %to, seq = e.seq, "status");
            }
            EventKind::TaskAdded | EventKind::TaskRemoved => {
                let event = if e.kind == EventKind::TaskAdded { "added" } else { "removed" };
                let status = e.to.as_ref().map(|s| s.as_label()).unwrap_or("-");
                tracing::info!(task, status, event, "group");
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                let reason = e.reason.as_deref().unwrap_or("-");
                tracing::warn!(subscriber = task, reason, "subscriber");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
