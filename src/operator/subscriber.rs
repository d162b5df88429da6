//! # Publisher / subscriber contract.
//!
//! Object-safe traits for a push-based pipeline with backpressure. All
//! callbacks are synchronous and may be invoked from any thread; an
//! implementation must tolerate reentrant calls (a subscriber calling
//! `request` or `cancel` from inside `receive`).

use std::sync::Arc;

use super::buffer::{Buffer, FailurePolicy};
use super::demand::Demand;
use super::expand::Expand;

/// Terminal signal of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<F> {
    /// The stream ended normally.
    Finished,
    /// The stream ended with an error.
    Failure(F),
}

impl<F> Completion<F> {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Completion::Failure(_))
    }
}

/// Handle a subscriber uses to pull values from its publisher.
pub trait Subscription: Send + Sync {
    /// Adds `demand` to what the subscriber is willing to receive.
    fn request(&self, demand: Demand);

    /// Stops the stream. Idempotent.
    fn cancel(&self);
}

/// Consumer side of the contract.
pub trait Subscriber<Input, Failure>: Send + Sync {
    /// Called once, before any value.
    fn receive_subscription(&self, subscription: Arc<dyn Subscription>);

    /// Delivers one value; returns how much *additional* demand the subscriber has.
    fn receive(&self, input: Input) -> Demand;

    /// Delivers the terminal signal; called at most once.
    fn receive_completion(&self, completion: Completion<Failure>);
}

/// Producer side of the contract.
pub trait Publisher {
    type Output;
    type Failure;

    /// Attaches `subscriber`; the publisher hands it a subscription.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<Self::Output, Self::Failure>>);
}

/// Operator combinators for every [`Publisher`].
pub trait PublisherExt: Publisher + Sized {
    /// Maps each value into an iterator and emits its items in order.
    fn expand<F, I>(self, f: F) -> Expand<Self, F>
    where
        F: Fn(Self::Output) -> I,
        I: IntoIterator,
    {
        Expand::new(self, f)
    }

    /// Requests everything from upstream and buffers it for downstream.
    fn buffer(self, policy: FailurePolicy) -> Buffer<Self> {
        Buffer::new(self, policy)
    }
}

impl<P: Publisher> PublisherExt for P {}
