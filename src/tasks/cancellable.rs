//! # Cancellable work handles.
//!
//! A task body returns something implementing [`Cancellable`]: whatever must
//! be told to stop when the task is canceled. The task stores it and calls
//! [`Cancellable::cancel`] at most once, and only on cancellation; on success
//! or failure it is simply dropped.

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Handle to in-flight work that can be asked to stop.
///
/// Cancellation is best-effort: the work may take arbitrarily long to observe it.
pub trait Cancellable: Send + 'static {
    /// Requests the work to stop.
    fn cancel(&self);
}

impl Cancellable for () {
    fn cancel(&self) {}
}

impl Cancellable for CancellationToken {
    fn cancel(&self) {
        CancellationToken::cancel(self);
    }
}

impl<T: Send + 'static> Cancellable for JoinHandle<T> {
    fn cancel(&self) {
        self.abort();
    }
}

impl Cancellable for AbortHandle {
    fn cancel(&self) {
        self.abort();
    }
}

impl<C: Cancellable> Cancellable for Option<C> {
    fn cancel(&self) {
        if let Some(c) = self {
            c.cancel();
        }
    }
}

impl<C: Cancellable> Cancellable for Vec<C> {
    fn cancel(&self) {
        for c in self {
            c.cancel();
        }
    }
}

impl Cancellable for Box<dyn Cancellable> {
    fn cancel(&self) {
        (**self).cancel();
    }
}

/// Runs a closure on the first `cancel`.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use taskflux::{Cancellable, OnCancel};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let h = hits.clone();
/// let c = OnCancel::new(move || { h.fetch_add(1, Ordering::SeqCst); });
/// c.cancel();
/// c.cancel();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct OnCancel<F> {
    f: Mutex<Option<F>>,
}

impl<F: FnOnce() + Send + 'static> OnCancel<F> {
    pub fn new(f: F) -> Self {
        Self {
            f: Mutex::new(Some(f)),
        }
    }
}

impl<F: FnOnce() + Send + 'static> Cancellable for OnCancel<F> {
    fn cancel(&self) {
        let f = self.f.lock().take();
        if let Some(f) = f {
            f();
        }
    }
}
