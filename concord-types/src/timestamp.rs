//! Scalar logical timestamps.
//!
//! A [`Timestamp`] is a single totally ordered `i64`. It is used as the causal
//! stamp of the scalar register and set variants, where two writes carrying
//! the same value are considered concurrent and broken by node order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A scalar logical clock value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Creates a timestamp from the wall clock (milliseconds since the Unix
    /// epoch). A clock set before the epoch yields [`Timestamp::ZERO`].
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns the next local tick.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Lamport receive rule: strictly greater than both this and `other`.
    #[must_use]
    pub fn receive(&self, other: &Self) -> Self {
        Self(self.0.max(other.0).saturating_add(1))
    }

    /// Returns true if this timestamp is strictly before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns true if this timestamp is strictly after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
