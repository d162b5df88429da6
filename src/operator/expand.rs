//! # Single-to-many expansion.
//!
//! [`ExpandOperator`] maps every upstream value into an iterator and emits
//! the iterator's items one by one as downstream demand allows. Upstream is
//! asked for the next value only once the current expansion is exhausted.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use super::base::{Operator, OperatorBase};
use super::subscriber::{Publisher, Subscriber};

/// [`Operator`] expanding each input through `f`.
pub struct ExpandOperator<In, I: IntoIterator, Fail, F> {
    f: Arc<F>,
    buffer: VecDeque<I::Item>,
    _marker: PhantomData<fn(In) -> Fail>,
}

impl<In, I: IntoIterator, Fail, F> ExpandOperator<In, I, Fail, F> {
    pub fn new(f: Arc<F>) -> Self {
        Self {
            f,
            buffer: VecDeque::new(),
            _marker: PhantomData,
        }
    }
}

impl<In, I, Fail, F> Operator for ExpandOperator<In, I, Fail, F>
where
    In: Send + 'static,
    I: IntoIterator + 'static,
    I::Item: Send + 'static,
    Fail: Send + 'static,
    F: Fn(In) -> I + Send + Sync + 'static,
{
    type Input = In;
    type Output = I::Item;
    type Failure = Fail;

    fn receive(&mut self, input: In) {
        self.buffer.extend((self.f)(input));
    }

    fn pop_value(&mut self) -> Option<I::Item> {
        self.buffer.pop_front()
    }

    fn has_sent_all_values(&self) -> bool {
        self.buffer.is_empty()
    }

    fn release_resources(&mut self) {
        self.buffer.clear();
    }
}

/// Publisher returned by [`PublisherExt::expand`](crate::PublisherExt::expand).
pub struct Expand<P, F> {
    upstream: P,
    f: Arc<F>,
}

impl<P, F> Expand<P, F> {
    pub fn new(upstream: P, f: F) -> Self {
        Self {
            upstream,
            f: Arc::new(f),
        }
    }
}

impl<P, F, I> Publisher for Expand<P, F>
where
    P: Publisher,
    P::Output: Send + 'static,
    P::Failure: Send + 'static,
    I: IntoIterator + 'static,
    I::Item: Send + 'static,
    F: Fn(P::Output) -> I + Send + Sync + 'static,
{
    type Output = I::Item;
    type Failure = P::Failure;

    fn subscribe(&self, subscriber: Arc<dyn Subscriber<I::Item, P::Failure>>) {
        let op = ExpandOperator::<P::Output, I, P::Failure, F>::new(Arc::clone(&self.f));
        self.upstream.subscribe(OperatorBase::new(op, subscriber));
    }
}

#[cfg(test)]
mod tests {
    use crate::operator::test_utils::{Recorder, Signal};
    use crate::operator::{Completion, Demand, Publisher, PublisherExt, Sequence};

    #[test]
    fn one_value_into_three_one_request_at_a_time() {
        let recorder: std::sync::Arc<Recorder<u32, ()>> = Recorder::new(Demand::NONE);
        Sequence::new(vec![10u32]).expand(|v| [v, v + 1, v + 2]).subscribe(recorder.clone());

        for expected in 1..=3 {
            recorder.request(Demand::max(1));
            assert_eq!(recorder.values().len(), expected);
        }
        assert_eq!(
            recorder.signals(),
            vec![
                Signal::Subscribed,
                Signal::Value(10),
                Signal::Value(11),
                Signal::Value(12),
                Signal::Completed(Completion::Finished),
            ]
        );
    }

    #[test]
    fn empty_expansions_are_skipped() {
        let recorder: std::sync::Arc<Recorder<u32, ()>> = Recorder::new(Demand::Unlimited);
        Sequence::new(vec![0u32, 2, 0, 1])
            .expand(|n| 0..n)
            .subscribe(recorder.clone());

        assert_eq!(recorder.values(), vec![0, 1, 0]);
        assert_eq!(recorder.completion(), Some(Completion::Finished));
    }

    #[test]
    fn upstream_failure_truncates() {
        let recorder: std::sync::Arc<Recorder<char, &'static str>> = Recorder::new(Demand::max(1));
        Sequence::new(vec!["ab"])
            .with_failure("upstream gone")
            .expand(|s: &str| s.chars().collect::<Vec<_>>())
            .subscribe(recorder.clone());

        assert_eq!(recorder.values(), vec!['a']);
        assert_eq!(recorder.completion(), Some(Completion::Failure("upstream gone")));
    }
}
