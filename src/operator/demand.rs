//! # Demand accounting.
//!
//! [`Demand`] is how many values a subscriber is still willing to receive.
//! Demand is cumulative: a new request adds to what is outstanding, and
//! `Unlimited` absorbs every finite addition.

use std::ops::{Add, AddAssign};

/// Number of values a subscriber accepts, or no limit at all.
///
/// # Example
/// ```
/// use taskflux::Demand;
///
/// assert_eq!(Demand::max(2) + Demand::max(3), Demand::max(5));
/// assert_eq!(Demand::max(2) + Demand::Unlimited, Demand::Unlimited);
/// assert_eq!(Demand::max(1).checked_decrement(), Some(Demand::NONE));
/// assert_eq!(Demand::NONE.checked_decrement(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demand {
    /// Any number of values.
    Unlimited,
    /// At most this many values.
    Max(usize),
}

impl Demand {
    /// No demand.
    pub const NONE: Demand = Demand::Max(0);

    /// Shorthand for [`Demand::Max`].
    #[inline]
    pub const fn max(n: usize) -> Self {
        Demand::Max(n)
    }

    /// `true` for `Max(0)`.
    #[inline]
    pub fn is_none(self) -> bool {
        self == Demand::NONE
    }

    #[inline]
    pub fn is_unlimited(self) -> bool {
        matches!(self, Demand::Unlimited)
    }

    /// Consumes one unit of demand. `None` when there was nothing to consume.
    #[inline]
    pub fn checked_decrement(self) -> Option<Demand> {
        match self {
            Demand::Unlimited => Some(Demand::Unlimited),
            Demand::Max(0) => None,
            Demand::Max(n) => Some(Demand::Max(n - 1)),
        }
    }

    /// Finite count, `None` when unlimited.
    #[inline]
    pub fn as_count(self) -> Option<usize> {
        match self {
            Demand::Unlimited => None,
            Demand::Max(n) => Some(n),
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Demand::NONE
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, rhs: Demand) -> Demand {
        match (self, rhs) {
            (Demand::Max(a), Demand::Max(b)) => match a.checked_add(b) {
                Some(n) => Demand::Max(n),
                None => Demand::Unlimited,
            },
            _ => Demand::Unlimited,
        }
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Demand) {
        *self = *self + rhs;
    }
}

/// Outstanding request an operator has made to its upstream.
///
/// Operators ask upstream for one value at a time, or for everything at once
/// when they buffer; tracking the outstanding request avoids asking twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum UpstreamDemand {
    /// Nothing requested.
    #[default]
    None,
    /// One value requested and not yet received.
    One,
    /// Everything requested.
    Unlimited,
}

impl UpstreamDemand {
    /// The matching [`Demand`] to pass to `Subscription::request`.
    #[inline]
    pub fn as_demand(self) -> Demand {
        match self {
            UpstreamDemand::None => Demand::NONE,
            UpstreamDemand::One => Demand::max(1),
            UpstreamDemand::Unlimited => Demand::Unlimited,
        }
    }
}
