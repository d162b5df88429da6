//! # Buffering operator.
//!
//! [`BufferOperator`] asks upstream for everything at subscription time and
//! queues values until downstream requests them.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use super::base::{Operator, OperatorBase};
use super::demand::UpstreamDemand;
use super::subscriber::{Publisher, Subscriber};

/// When an upstream failure reaches downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Deliver the failure at once, dropping buffered values.
    #[default]
    Immediate,
    /// Deliver buffered values first, then the failure.
    AfterDrain,
}

/// FIFO buffer with unlimited upstream demand.
pub struct BufferOperator<T, Fail> {
    buffer: VecDeque<T>,
    policy: FailurePolicy,
    _marker: PhantomData<fn() -> Fail>,
}

impl<T, Fail> BufferOperator<T, Fail> {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            buffer: VecDeque::new(),
            policy,
            _marker: PhantomData,
        }
    }

    /// Values currently queued.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl<T, Fail> Operator for BufferOperator<T, Fail>
where
    T: Send + 'static,
    Fail: Send + 'static,
{
    type Input = T;
    type Output = T;
    type Failure = Fail;

    fn receive(&mut self, input: T) {
        self.buffer.push_back(input);
    }

    fn pop_value(&mut self) -> Option<T> {
        self.buffer.pop_front()
    }

    fn has_sent_all_values(&self) -> bool {
        self.buffer.is_empty()
    }

    fn supports_unlimited_upstream_demand(&self) -> bool {
        true
    }

    fn should_immediately_complete_on_failure(&self) -> bool {
        self.policy == FailurePolicy::Immediate
    }

    fn initial_upstream_demand(&self) -> UpstreamDemand {
        UpstreamDemand::Unlimited
    }

    fn release_resources(&mut self) {
        self.buffer.clear();
    }
}

/// Publisher returned by [`PublisherExt::buffer`](crate::PublisherExt::buffer).
pub struct Buffer<P> {
    upstream: P,
    policy: FailurePolicy,
}

impl<P> Buffer<P> {
    pub fn new(upstream: P, policy: FailurePolicy) -> Self {
        Self { upstream, policy }
    }
}

impl<P> Publisher for Buffer<P>
where
    P: Publisher,
    P::Output: Send + 'static,
    P::Failure: Send + 'static,
{
    type Output = P::Output;
    type Failure = P::Failure;

    fn subscribe(&self, subscriber: Arc<dyn Subscriber<P::Output, P::Failure>>) {
        let op = BufferOperator::<P::Output, P::Failure>::new(self.policy);
        self.upstream.subscribe(OperatorBase::new(op, subscriber));
    }
}
