//! Test doubles for the publisher/subscriber contract.

use std::sync::Arc;

use parking_lot::Mutex;

use super::demand::Demand;
use super::subscriber::{Completion, Subscriber, Subscription};

/// Upstream subscription that only records what it was asked for.
#[derive(Default)]
pub(crate) struct ManualUpstream {
    requests: Mutex<Vec<Demand>>,
    cancellations: Mutex<usize>,
}

impl ManualUpstream {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn requests(&self) -> Vec<Demand> {
        self.requests.lock().clone()
    }

    pub(crate) fn cancellations(&self) -> usize {
        *self.cancellations.lock()
    }
}

impl Subscription for ManualUpstream {
    fn request(&self, demand: Demand) {
        self.requests.lock().push(demand);
    }

    fn cancel(&self) {
        *self.cancellations.lock() += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal<T, F> {
    Subscribed,
    Value(T),
    Completed(Completion<F>),
}

struct RecorderState<T, F> {
    signals: Vec<Signal<T, F>>,
    subscription: Option<Arc<dyn Subscription>>,
    cancel_after: Option<usize>,
    request_on_value: Demand,
}

/// Downstream subscriber recording every signal it receives.
pub(crate) struct Recorder<T, F> {
    initial: Demand,
    state: Mutex<RecorderState<T, F>>,
}

impl<T, F> Recorder<T, F>
where
    T: Clone + Send + 'static,
    F: Clone + Send + 'static,
{
    /// `initial` is requested as soon as the subscription arrives.
    pub(crate) fn new(initial: Demand) -> Arc<Self> {
        Arc::new(Self {
            initial,
            state: Mutex::new(RecorderState {
                signals: Vec::new(),
                subscription: None,
                cancel_after: None,
                request_on_value: Demand::NONE,
            }),
        })
    }

    /// Cancels the subscription from inside `receive` once `n` values arrived.
    pub(crate) fn cancel_after(&self, n: usize) {
        self.state.lock().cancel_after = Some(n);
    }

    /// Calls `request(demand)` from inside every `receive`.
    pub(crate) fn request_on_value(&self, demand: Demand) {
        self.state.lock().request_on_value = demand;
    }

    pub(crate) fn request(&self, demand: Demand) {
        let sub = self.state.lock().subscription.clone();
        if let Some(sub) = sub {
            sub.request(demand);
        }
    }

    pub(crate) fn cancel(&self) {
        let sub = self.state.lock().subscription.clone();
        if let Some(sub) = sub {
            sub.cancel();
        }
    }

    pub(crate) fn signals(&self) -> Vec<Signal<T, F>> {
        self.state.lock().signals.clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.state
            .lock()
            .signals
            .iter()
            .filter_map(|s| match s {
                Signal::Value(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn completion(&self) -> Option<Completion<F>> {
        self.state.lock().signals.iter().find_map(|s| match s {
            Signal::Completed(c) => Some(c.clone()),
            _ => None,
        })
    }
}

impl<T, F> Subscriber<T, F> for Recorder<T, F>
where
    T: Clone + Send + 'static,
    F: Clone + Send + 'static,
{
    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        {
            let mut state = self.state.lock();
            state.signals.push(Signal::Subscribed);
            state.subscription = Some(Arc::clone(&subscription));
        }
        if !self.initial.is_none() {
            subscription.request(self.initial);
        }
    }

    fn receive(&self, input: T) -> Demand {
        let (cancel, request, sub) = {
            let mut state = self.state.lock();
            state.signals.push(Signal::Value(input));
            let received = state
                .signals
                .iter()
                .filter(|s| matches!(s, Signal::Value(_)))
                .count();
            let cancel = state.cancel_after.is_some_and(|n| received >= n);
            (cancel, state.request_on_value, state.subscription.clone())
        };
        if let Some(sub) = sub {
            if cancel {
                sub.cancel();
            } else if !request.is_none() {
                sub.request(request);
            }
        }
        Demand::NONE
    }

    fn receive_completion(&self, completion: Completion<F>) {
        self.state.lock().signals.push(Signal::Completed(completion));
    }
}
