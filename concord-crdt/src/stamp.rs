//! Causal stamps: the "when" attached to every register write and every
//! stamped set element.
//!
//! Two stamp types are supported, the scalar [`Timestamp`] and the
//! [`VectorClock`]. Generic CRDTs take the stamp as a type parameter so the
//! scalar and vector-clock variants share one implementation.

use crate::vector_clock::{CausalOrder, VectorClock};
use concord_types::Timestamp;
use std::cmp::Ordering;
use std::fmt::Debug;

/// A value that can order two writes.
pub trait CausalStamp: Clone + Debug + PartialEq {
    /// Causal relationship of `self` to `other`.
    ///
    /// For a totally ordered stamp, equal values are [`CausalOrder::Same`]
    /// and nothing is ever [`CausalOrder::Concurrent`].
    fn causal_cmp(&self, other: &Self) -> CausalOrder;

    /// A total order consistent with [`CausalStamp::causal_cmp`]. Used
    /// wherever a merge must pick one winner even between concurrent stamps.
    fn arbitrate(&self, other: &Self) -> Ordering;

    /// True if `self` strictly dominates `other`.
    fn dominates(&self, other: &Self) -> bool {
        self.causal_cmp(other) == CausalOrder::After
    }
}

impl CausalStamp for Timestamp {
    fn causal_cmp(&self, other: &Self) -> CausalOrder {
        self.cmp(other).into()
    }

    fn arbitrate(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl CausalStamp for VectorClock {
    fn causal_cmp(&self, other: &Self) -> CausalOrder {
        self.compare(other)
    }

    fn arbitrate(&self, other: &Self) -> Ordering {
        VectorClock::arbitrate(self, other)
    }
}
