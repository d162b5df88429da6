//! # Non-synchronous operator core.
//!
//! [`OperatorBase`] sits between an upstream publisher and a downstream
//! subscriber. It owns the demand bookkeeping; an [`Operator`] implementation
//! only decides how upstream values become downstream values.
//!
//! ## Locking
//! One non-reentrant mutex guards all state. Every call into downstream or
//! upstream happens with the mutex **released**, so a subscriber may call
//! `request`/`cancel` from inside `receive` without deadlocking. While a drain
//! loop has the lock released, `sending` stays set; a reentrant drain sees it
//! and returns immediately, leaving the running loop to pick up the new state.
//!
//! ## Drain loop
//! ```text
//! while !cancelled && pending > 0 && !failure_preempts {
//!     match op.pop_value() {
//!         Some(v) => { pending -= 1; unlock; pending += downstream.receive(v); lock }
//!         None if upstream finished => { assert!(op.has_sent_all_values()); break }
//!         None => return "ask upstream for one more (or unlimited)"
//!     }
//! }
//! deliver completion once, if recorded and (failure preempts || op.has_sent_all_values())
//! ```

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use super::demand::{Demand, UpstreamDemand};
use super::subscriber::{Completion, Subscriber, Subscription};
use crate::error::OperatorError;

/// Per-operator hooks plugged into [`OperatorBase`].
///
/// Every method runs with the operator lock held; none may call back into
/// the pipeline.
pub trait Operator: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;
    type Failure: Send + 'static;

    /// Incorporates one upstream value into internal state.
    fn receive(&mut self, input: Self::Input);

    /// Next value ready for downstream, or `None` if nothing is ready now.
    fn pop_value(&mut self) -> Option<Self::Output>;

    /// `true` when no value is left to send. Once upstream has completed, this
    /// must hold whenever [`pop_value`](Self::pop_value) returns `None`.
    fn has_sent_all_values(&self) -> bool;

    /// Whether the operator may request unlimited values from upstream
    /// (required for any buffering operator).
    fn supports_unlimited_upstream_demand(&self) -> bool {
        false
    }

    /// Whether an upstream failure truncates pending output (`true`) or is
    /// delivered after the remaining values drain (`false`).
    fn should_immediately_complete_on_failure(&self) -> bool {
        true
    }

    /// Demand requested from upstream as soon as the subscription arrives.
    fn initial_upstream_demand(&self) -> UpstreamDemand {
        UpstreamDemand::None
    }

    /// Releases buffered state after cancellation.
    fn release_resources(&mut self) {}
}

struct State<O: Operator> {
    op: O,
    downstream: Option<Arc<dyn Subscriber<O::Output, O::Failure>>>,
    upstream: Option<Arc<dyn Subscription>>,
    upstream_demand: UpstreamDemand,
    pending_downstream_demand: Demand,
    upstream_finished: bool,
    completion: Option<Completion<O::Failure>>,
    cancelled: bool,
    sending_to_downstream: bool,
    delivered_completion: bool,
}

impl<O: Operator> State<O> {
    fn failure_preempts(&self) -> bool {
        matches!(self.completion, Some(Completion::Failure(_)))
            && self.op.should_immediately_complete_on_failure()
    }
}

/// Reusable subscriber/subscription pair implementing one [`Operator`].
///
/// `OperatorBase` is the [`Subscriber`] handed to upstream and the
/// [`Subscription`] handed to downstream.
///
/// ### Guarantees
/// - Never delivers more values than downstream requested.
/// - Values reach downstream in `pop_value` order.
/// - Completion is delivered at most once, and a successful completion only
///   after every value was sent.
/// - At most one outstanding request to upstream (one value, or unlimited).
///
/// ### Panics
/// When an [`Operator`] breaks its contract (see
/// [`OperatorError::UnsentValuesAfterCompletion`]).
pub struct OperatorBase<O: Operator> {
    state: Mutex<State<O>>,
    me: Weak<Self>,
}

impl<O: Operator> OperatorBase<O> {
    /// Wraps `op`, delivering its output to `downstream`.
    ///
    /// Subscribe the returned value to an upstream publisher to start the flow.
    pub fn new(op: O, downstream: Arc<dyn Subscriber<O::Output, O::Failure>>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            state: Mutex::new(State {
                op,
                downstream: Some(downstream),
                upstream: None,
                upstream_demand: UpstreamDemand::None,
                pending_downstream_demand: Demand::NONE,
                upstream_finished: false,
                completion: None,
                cancelled: false,
                sending_to_downstream: false,
                delivered_completion: false,
            }),
            me: me.clone(),
        })
    }

    /// `true` once `cancel` ran.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Demand downstream requested and has not been served yet.
    pub fn pending_demand(&self) -> Demand {
        self.state.lock().pending_downstream_demand
    }

    /// Drains what demand allows. Returns the upstream demand the drain wants
    /// next; `NONE` when called reentrantly.
    fn send_available_values(&self, state: &mut MutexGuard<'_, State<O>>) -> Demand {
        if state.sending_to_downstream {
            return Demand::NONE;
        }
        state.sending_to_downstream = true;
        let wanted = self.drain(state);
        state.sending_to_downstream = false;
        wanted
    }

    fn drain(&self, state: &mut MutexGuard<'_, State<O>>) -> Demand {
        while !state.cancelled
            && !state.pending_downstream_demand.is_none()
            && !state.failure_preempts()
        {
            let Some(downstream) = state.downstream.clone() else {
                break;
            };
            match state.op.pop_value() {
                Some(value) => {
                    state.pending_downstream_demand = state
                        .pending_downstream_demand
                        .checked_decrement()
                        .unwrap_or(Demand::NONE);
                    let more = MutexGuard::unlocked(state, || downstream.receive(value));
                    state.pending_downstream_demand += more;
                }
                None if state.upstream_finished => {
                    assert!(
                        state.op.has_sent_all_values(),
                        "{}",
                        OperatorError::UnsentValuesAfterCompletion
                    );
                    break;
                }
                None => {
                    let unlimited = state.pending_downstream_demand.is_unlimited()
                        && state.op.supports_unlimited_upstream_demand();
                    return if unlimited {
                        Demand::Unlimited
                    } else {
                        Demand::max(1)
                    };
                }
            }
        }

        self.deliver_completion_if_ready(state);
        Demand::NONE
    }

    fn deliver_completion_if_ready(&self, state: &mut MutexGuard<'_, State<O>>) {
        if state.cancelled || state.completion.is_none() {
            return;
        }
        if !state.failure_preempts() && !state.op.has_sent_all_values() {
            return;
        }
        assert!(
            !state.delivered_completion,
            "{}",
            OperatorError::CompletionDeliveredTwice
        );
        let (Some(completion), Some(downstream)) = (state.completion.take(), state.downstream.take())
        else {
            return;
        };
        state.delivered_completion = true;
        MutexGuard::unlocked(state, || downstream.receive_completion(completion));
    }

    /// Issues at most one upstream request matching `wanted`.
    fn request_upstream(&self, mut state: MutexGuard<'_, State<O>>, wanted: Demand) {
        if wanted.is_none() || state.cancelled || state.upstream_finished {
            return;
        }
        let next = if wanted.is_unlimited() {
            UpstreamDemand::Unlimited
        } else {
            UpstreamDemand::One
        };
        if state.upstream_demand >= next {
            return;
        }
        let Some(upstream) = state.upstream.clone() else {
            return;
        };
        state.upstream_demand = next;
        drop(state);
        upstream.request(next.as_demand());
    }
}

impl<O: Operator> Subscriber<O::Input, O::Failure> for OperatorBase<O> {
    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        let mut state = self.state.lock();
        if state.cancelled || state.upstream.is_some() {
            drop(state);
            subscription.cancel();
            return;
        }
        state.upstream = Some(Arc::clone(&subscription));
        let initial = state.op.initial_upstream_demand();
        state.upstream_demand = initial;
        let downstream = state.downstream.clone();
        drop(state);

        // Downstream must hold its subscription before upstream can emit.
        if let (Some(downstream), Some(me)) = (downstream, self.me.upgrade()) {
            downstream.receive_subscription(me);
        }
        if initial != UpstreamDemand::None {
            subscription.request(initial.as_demand());
        }
    }

    fn receive(&self, input: O::Input) -> Demand {
        let mut state = self.state.lock();
        if state.cancelled || state.upstream_finished {
            return Demand::NONE;
        }
        if state.upstream_demand == UpstreamDemand::One {
            state.upstream_demand = UpstreamDemand::None;
        }
        state.op.receive(input);

        let wanted = self.send_available_values(&mut state);
        if wanted.is_none()
            || state.cancelled
            || state.upstream_demand == UpstreamDemand::Unlimited
        {
            return Demand::NONE;
        }
        if wanted.is_unlimited() {
            state.upstream_demand = UpstreamDemand::Unlimited;
            Demand::Unlimited
        } else {
            state.upstream_demand = UpstreamDemand::One;
            Demand::max(1)
        }
    }

    fn receive_completion(&self, completion: Completion<O::Failure>) {
        let mut state = self.state.lock();
        if state.cancelled || state.upstream_finished {
            return;
        }
        state.upstream_finished = true;
        state.upstream_demand = UpstreamDemand::None;
        state.completion = Some(completion);
        let upstream = state.upstream.take();

        let _ = self.send_available_values(&mut state);
        drop(state);
        drop(upstream);
    }
}

impl<O: Operator> Subscription for OperatorBase<O> {
    fn request(&self, demand: Demand) {
        let mut state = self.state.lock();
        if state.cancelled || state.delivered_completion {
            return;
        }
        state.pending_downstream_demand += demand;
        let wanted = self.send_available_values(&mut state);
        self.request_upstream(state, wanted);
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        let upstream = state.upstream.take();
        let downstream = state.downstream.take();
        state.op.release_resources();
        drop(state);

        if let Some(upstream) = upstream {
            upstream.cancel();
        }
        drop(downstream);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::operator::test_utils::{ManualUpstream, Recorder, Signal};

    /// Splits each string into its characters.
    struct Chars {
        buffer: VecDeque<char>,
        unlimited: bool,
        immediate_failure: bool,
        released: bool,
    }

    impl Chars {
        fn new() -> Self {
            Self {
                buffer: VecDeque::new(),
                unlimited: false,
                immediate_failure: true,
                released: false,
            }
        }
    }

    impl Operator for Chars {
        type Input = &'static str;
        type Output = char;
        type Failure = &'static str;

        fn receive(&mut self, input: &'static str) {
            self.buffer.extend(input.chars());
        }

        fn pop_value(&mut self) -> Option<char> {
            self.buffer.pop_front()
        }

        fn has_sent_all_values(&self) -> bool {
            self.buffer.is_empty()
        }

        fn supports_unlimited_upstream_demand(&self) -> bool {
            self.unlimited
        }

        fn should_immediately_complete_on_failure(&self) -> bool {
            self.immediate_failure
        }

        fn release_resources(&mut self) {
            self.released = true;
            self.buffer.clear();
        }
    }

    /// Claims a value is pending but never produces it.
    struct Liar;

    impl Operator for Liar {
        type Input = ();
        type Output = ();
        type Failure = ();

        fn receive(&mut self, _input: ()) {}

        fn pop_value(&mut self) -> Option<()> {
            None
        }

        fn has_sent_all_values(&self) -> bool {
            false
        }
    }

    fn wire(op: Chars, recorder: &Arc<Recorder<char, &'static str>>) -> (Arc<OperatorBase<Chars>>, Arc<ManualUpstream>) {
        let base = OperatorBase::new(op, recorder.clone());
        let upstream = ManualUpstream::new();
        base.receive_subscription(upstream.clone());
        (base, upstream)
    }

    #[test]
    fn single_input_expands_one_request_at_a_time() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        assert_eq!(upstream.requests(), vec![Demand::max(1)]);

        assert_eq!(base.receive("abc"), Demand::NONE);
        assert_eq!(recorder.values(), vec!['a']);

        recorder.request(Demand::max(1));
        assert_eq!(recorder.values(), vec!['a', 'b']);
        base.receive_completion(Completion::Finished);
        assert!(recorder.completion().is_none());

        recorder.request(Demand::max(1));
        assert_eq!(recorder.values(), vec!['a', 'b', 'c']);
        assert_eq!(recorder.completion(), Some(Completion::Finished));
        assert_eq!(upstream.requests(), vec![Demand::max(1)]);
    }

    #[test]
    fn never_delivers_more_than_requested() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, _upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(2));
        base.receive("abcdef");
        assert_eq!(recorder.values(), vec!['a', 'b']);
        assert_eq!(base.pending_demand(), Demand::NONE);

        recorder.request(Demand::max(3));
        assert_eq!(recorder.values(), vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn keeps_fifo_order_across_inputs() {
        let recorder = Recorder::new(Demand::max(1));
        let (base, upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::Unlimited);
        for input in ["ab", "c", "de"] {
            assert_eq!(base.receive(input), Demand::max(1));
        }
        base.receive_completion(Completion::Finished);

        assert_eq!(recorder.values(), vec!['a', 'b', 'c', 'd', 'e']);
        assert_eq!(recorder.completion(), Some(Completion::Finished));
        assert_eq!(upstream.requests(), vec![Demand::max(1)]);
    }

    #[test]
    fn upstream_request_is_not_duplicated() {
        let recorder = Recorder::new(Demand::NONE);
        let (_base, upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        recorder.request(Demand::max(1));
        recorder.request(Demand::max(4));
        assert_eq!(upstream.requests(), vec![Demand::max(1)]);
    }

    #[test]
    fn unlimited_downstream_unlocks_unlimited_upstream_when_supported() {
        let recorder = Recorder::new(Demand::NONE);
        let mut op = Chars::new();
        op.unlimited = true;
        let (base, upstream) = wire(op, &recorder);

        recorder.request(Demand::Unlimited);
        assert_eq!(upstream.requests(), vec![Demand::Unlimited]);
        assert_eq!(base.receive("xy"), Demand::NONE);
        assert_eq!(recorder.values(), vec!['x', 'y']);
    }

    #[test]
    fn finished_completion_waits_for_buffer_to_drain() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, _upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        base.receive("xyz");
        base.receive_completion(Completion::Finished);
        assert_eq!(recorder.signals(), vec![Signal::Subscribed, Signal::Value('x')]);

        recorder.request(Demand::max(5));
        assert_eq!(
            recorder.signals(),
            vec![
                Signal::Subscribed,
                Signal::Value('x'),
                Signal::Value('y'),
                Signal::Value('z'),
                Signal::Completed(Completion::Finished),
            ]
        );
    }

    #[test]
    fn failure_preempts_buffer_by_default() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, _upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        base.receive("xyz");
        base.receive_completion(Completion::Failure("boom"));

        assert_eq!(recorder.values(), vec!['x']);
        assert_eq!(recorder.completion(), Some(Completion::Failure("boom")));

        recorder.request(Demand::max(5));
        assert_eq!(recorder.values(), vec!['x']);
    }

    #[test]
    fn failure_can_wait_for_drain() {
        let recorder = Recorder::new(Demand::NONE);
        let mut op = Chars::new();
        op.immediate_failure = false;
        let (base, _upstream) = wire(op, &recorder);

        recorder.request(Demand::max(1));
        base.receive("xy");
        base.receive_completion(Completion::Failure("late"));
        assert!(recorder.completion().is_none());

        recorder.request(Demand::max(1));
        assert_eq!(recorder.values(), vec!['x', 'y']);
        assert_eq!(recorder.completion(), Some(Completion::Failure("late")));
    }

    #[test]
    fn completion_without_values_needs_no_demand() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, _upstream) = wire(Chars::new(), &recorder);

        base.receive_completion(Completion::Finished);
        assert_eq!(recorder.completion(), Some(Completion::Finished));
    }

    #[test]
    fn cancel_releases_and_cancels_upstream_once() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        base.receive("abc");
        base.cancel();
        base.cancel();

        assert!(base.is_cancelled());
        assert_eq!(upstream.cancellations(), 1);
        assert_eq!(base.receive("more"), Demand::NONE);
        recorder.request(Demand::max(10));
        base.receive_completion(Completion::Finished);
        assert_eq!(recorder.values(), vec!['a']);
        assert!(recorder.completion().is_none());
    }

    #[test]
    fn reentrant_cancel_from_receive_stops_delivery() {
        let recorder = Recorder::new(Demand::NONE);
        recorder.cancel_after(2);
        let (base, upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::Unlimited);
        base.receive("abcdef");

        assert_eq!(recorder.values(), vec!['a', 'b']);
        assert_eq!(upstream.cancellations(), 1);
        assert!(base.is_cancelled());
    }

    #[test]
    fn reentrant_request_from_receive_is_honored() {
        let recorder = Recorder::new(Demand::NONE);
        recorder.request_on_value(Demand::max(1));
        let (base, _upstream) = wire(Chars::new(), &recorder);

        recorder.request(Demand::max(1));
        base.receive("abcd");
        assert_eq!(recorder.values(), vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn subscription_after_cancel_is_cancelled() {
        let recorder: Arc<Recorder<char, &'static str>> = Recorder::new(Demand::NONE);
        let base = OperatorBase::new(Chars::new(), recorder.clone());
        base.cancel();

        let upstream = ManualUpstream::new();
        base.receive_subscription(upstream.clone());
        assert_eq!(upstream.cancellations(), 1);
        assert_eq!(recorder.signals(), vec![]);
    }

    #[test]
    fn second_subscription_is_rejected() {
        let recorder = Recorder::new(Demand::NONE);
        let (base, first) = wire(Chars::new(), &recorder);

        let second = ManualUpstream::new();
        base.receive_subscription(second.clone());
        assert_eq!(second.cancellations(), 1);
        assert_eq!(first.cancellations(), 0);
    }

    #[test]
    fn upstream_and_downstream_threads_see_linear_delivery() {
        const INPUTS: [&str; 4] = ["ab", "cde", "", "fg"];
        let expected: Vec<char> = INPUTS.iter().cycle().take(100).flat_map(|s| s.chars()).collect();

        for _ in 0..50 {
            let recorder = Recorder::new(Demand::NONE);
            let (base, _upstream) = wire(Chars::new(), &recorder);

            let producer = {
                let base = Arc::clone(&base);
                std::thread::spawn(move || {
                    for input in INPUTS.iter().cycle().take(100) {
                        base.receive(*input);
                    }
                    base.receive_completion(Completion::Finished);
                })
            };
            let consumer = {
                let recorder = Arc::clone(&recorder);
                let total = expected.len();
                std::thread::spawn(move || {
                    for _ in 0..total {
                        recorder.request(Demand::max(1));
                        std::thread::yield_now();
                    }
                })
            };
            producer.join().unwrap();
            consumer.join().unwrap();

            assert_eq!(recorder.values(), expected);
            let completions = recorder
                .signals()
                .iter()
                .filter(|s| matches!(s, Signal::Completed(_)))
                .count();
            assert_eq!(completions, 1);
            assert_eq!(recorder.completion(), Some(Completion::Finished));
        }
    }

    #[test]
    #[should_panic(expected = "reports unsent values")]
    fn contract_violation_panics() {
        let recorder: Arc<Recorder<(), ()>> = Recorder::new(Demand::NONE);
        let base = OperatorBase::new(Liar, recorder.clone());
        base.receive_subscription(ManualUpstream::new());
        recorder.request(Demand::max(1));
        base.receive(());
        base.receive_completion(Completion::Finished);
    }
}
