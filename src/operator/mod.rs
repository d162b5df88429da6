//! # Backpressure-aware stream operators.
//!
//! A small push-based producer/consumer contract (upstream → operator →
//! downstream) with explicit demand, plus [`OperatorBase`]: a reusable
//! operator core that turns each upstream item into zero or more downstream
//! items without ever sending more than downstream asked for.
//!
//! ## Contract
//! ```text
//!   Publisher ── subscribe(subscriber) ──► Subscriber::receive_subscription(sub)
//!   Subscriber ── sub.request(n) ────────► Publisher may now send n values
//!   Publisher ── receive(value) ─────────► returns additional demand
//!   Publisher ── receive_completion(c) ──► no value follows
//!   Subscriber ── sub.cancel() ──────────► no value follows, resources released
//! ```
//!
//! ## Contents
//! - [`Demand`], [`UpstreamDemand`] demand accounting
//! - [`Subscriber`], [`Subscription`], [`Publisher`], [`Completion`] the contract
//! - [`Operator`], [`OperatorBase`] the non-synchronous operator core
//! - [`ExpandOperator`], [`BufferOperator`] concrete operators
//! - [`Sequence`], [`Expand`], [`Buffer`], [`PublisherExt`] publishers

mod base;
mod buffer;
mod demand;
mod expand;
mod sequence;
mod subscriber;

#[cfg(test)]
pub(crate) mod test_utils;

pub use base::{Operator, OperatorBase};
pub use buffer::{Buffer, BufferOperator, FailurePolicy};
pub use demand::{Demand, UpstreamDemand};
pub use expand::{Expand, ExpandOperator};
pub use sequence::Sequence;
pub use subscriber::{Completion, Publisher, PublisherExt, Subscriber, Subscription};
