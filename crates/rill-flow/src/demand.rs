#![forbid(unsafe_code)]

//! Saturating demand accounting.
//!
//! Demand is the number of `on_next` deliveries an observer has asked for and
//! not yet received. Requests add to it, deliveries subtract from it.
//!
//! # Invariants
//!
//! 1. Demand never overflows: additions saturate at [`Demand::UNBOUNDED`].
//! 2. Once unbounded, demand stays unbounded. Deliveries do not decrement it.
//! 3. Consuming from zero demand is refused, never wraps.

use std::fmt;

/// Outstanding demand of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Demand(u64);

impl Demand {
    /// No outstanding demand.
    pub const ZERO: Self = Self(0);

    /// Sentinel for "unlimited". Any sum reaching `u64::MAX` lands here.
    pub const UNBOUNDED: Self = Self(u64::MAX);

    /// Create a demand value. `u64::MAX` is treated as unbounded.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Raw count (`u64::MAX` when unbounded).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.0 == u64::MAX
    }

    /// Add `n` to the demand, saturating at [`Demand::UNBOUNDED`].
    #[must_use]
    pub const fn saturating_add(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }

    /// Consume one unit of demand.
    ///
    /// Returns `false` if there is no demand left. Unbounded demand is not
    /// decremented.
    pub fn try_consume_one(&mut self) -> bool {
        if self.is_unbounded() {
            return true;
        }
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

impl From<u64> for Demand {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "unbounded")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let d = Demand::default();
        assert!(d.is_zero());
        assert!(!d.is_unbounded());
        assert_eq!(d, Demand::ZERO);
    }

    #[test]
    fn add_accumulates() {
        let d = Demand::ZERO.saturating_add(3).saturating_add(4);
        assert_eq!(d.get(), 7);
    }

    #[test]
    fn add_saturates_to_unbounded() {
        let d = Demand::new(u64::MAX - 1).saturating_add(5);
        assert!(d.is_unbounded());
        assert_eq!(d, Demand::UNBOUNDED);
    }

    #[test]
    fn consume_decrements_until_zero() {
        let mut d = Demand::new(2);
        assert!(d.try_consume_one());
        assert!(d.try_consume_one());
        assert!(!d.try_consume_one());
        assert!(d.is_zero());
    }

    #[test]
    fn unbounded_is_never_decremented() {
        let mut d = Demand::UNBOUNDED;
        for _ in 0..1000 {
            assert!(d.try_consume_one());
        }
        assert!(d.is_unbounded());
    }

    #[test]
    fn display() {
        assert_eq!(Demand::new(42).to_string(), "42");
        assert_eq!(Demand::UNBOUNDED.to_string(), "unbounded");
    }
}
