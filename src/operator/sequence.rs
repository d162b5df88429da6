//! # Sequence publisher.
//!
//! [`Sequence`] replays a fixed list of values to each subscriber, honoring
//! demand, then finishes (or fails, when built with
//! [`with_failure`](Sequence::with_failure)).

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use super::demand::Demand;
use super::subscriber::{Completion, Publisher, Subscriber, Subscription};

/// Publisher of a fixed list of values.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use taskflux::{Completion, Demand, Publisher, Sequence, Subscriber, Subscription};
///
/// #[derive(Default)]
/// struct Sum(Mutex<u32>);
///
/// impl Subscriber<u32, ()> for Sum {
///     fn receive_subscription(&self, s: Arc<dyn Subscription>) { s.request(Demand::Unlimited) }
///     fn receive(&self, v: u32) -> Demand { *self.0.lock() += v; Demand::NONE }
///     fn receive_completion(&self, _: Completion<()>) {}
/// }
///
/// let sum = Arc::new(Sum::default());
/// Sequence::new(vec![1, 2, 3]).subscribe(sum.clone());
/// assert_eq!(*sum.0.lock(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct Sequence<T, F> {
    values: Vec<T>,
    failure: Option<F>,
}

impl<T, F> Sequence<T, F> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            failure: None,
        }
    }

    /// Ends the stream with `failure` instead of finishing.
    pub fn with_failure(mut self, failure: F) -> Self {
        self.failure = Some(failure);
        self
    }
}

impl<T, F> Publisher for Sequence<T, F>
where
    T: Clone + Send + 'static,
    F: Clone + Send + 'static,
{
    type Output = T;
    type Failure = F;

    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T, F>>) {
        let subscription = SequenceSubscription::new(
            self.values.iter().cloned().collect(),
            self.failure.clone(),
            Arc::clone(&subscriber),
        );
        subscriber.receive_subscription(subscription.clone());
        // An empty sequence completes without waiting for demand.
        subscription.request(Demand::NONE);
    }
}

struct SequenceState<T, F> {
    values: VecDeque<T>,
    failure: Option<F>,
    downstream: Option<Arc<dyn Subscriber<T, F>>>,
    pending: Demand,
    emitting: bool,
}

struct SequenceSubscription<T, F> {
    state: Mutex<SequenceState<T, F>>,
    me: Weak<Self>,
}

impl<T, F> SequenceSubscription<T, F>
where
    T: Send + 'static,
    F: Send + 'static,
{
    fn new(
        values: VecDeque<T>,
        failure: Option<F>,
        downstream: Arc<dyn Subscriber<T, F>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            state: Mutex::new(SequenceState {
                values,
                failure,
                downstream: Some(downstream),
                pending: Demand::NONE,
                emitting: false,
            }),
            me: me.clone(),
        })
    }

    fn emit(&self, state: &mut MutexGuard<'_, SequenceState<T, F>>) {
        // Keeps the subscription alive while downstream may drop its handle.
        let _me = self.me.upgrade();
        loop {
            let Some(downstream) = state.downstream.clone() else {
                return;
            };
            if state.values.is_empty() {
                state.downstream = None;
                let completion = match state.failure.take() {
                    Some(failure) => Completion::Failure(failure),
                    None => Completion::Finished,
                };
                MutexGuard::unlocked(state, || downstream.receive_completion(completion));
                return;
            }
            let Some(pending) = state.pending.checked_decrement() else {
                return;
            };
            state.pending = pending;
            let Some(value) = state.values.pop_front() else {
                return;
            };
            let more = MutexGuard::unlocked(state, || downstream.receive(value));
            state.pending += more;
        }
    }
}

impl<T, F> Subscription for SequenceSubscription<T, F>
where
    T: Send + 'static,
    F: Send + 'static,
{
    fn request(&self, demand: Demand) {
        let mut state = self.state.lock();
        state.pending += demand;
        if state.emitting {
            return;
        }
        state.emitting = true;
        self.emit(&mut state);
        state.emitting = false;
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        state.values.clear();
        let downstream = state.downstream.take();
        drop(state);
        drop(downstream);
    }
}
