//! Grow-only and Positive-Negative counters.
//!
//! Each node owns one monotone accumulator. Merging takes the per-node
//! maximum, never the sum: a node's accumulator only ever grows, so the
//! larger value already includes everything the smaller one saw, and merging
//! the same state twice cannot double count.
//!
//! A PN-Counter is two G-Counters, one for additions and one for
//! subtractions. Its value is `sum(additions) - sum(subtractions)`.

use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use concord_types::{CounterDelta, CounterOperation, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node's accumulated contribution to a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterElement {
    pub node: NodeId,
    pub value: u64,
}

/// A grow-only counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GCounter {
    additions: BTreeMap<NodeId, u64>,
}

impl GCounter {
    /// Creates a new counter with value 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a counter from stored elements. Duplicate nodes keep their
    /// largest value.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = CounterElement>) -> Self {
        let mut additions = BTreeMap::new();
        for element in elements {
            let entry = additions.entry(element.node).or_insert(element.value);
            *entry = (*entry).max(element.value);
        }
        Self { additions }
    }

    /// Returns the per-node elements, in node order.
    pub fn elements(&self) -> impl Iterator<Item = CounterElement> + '_ {
        self.additions
            .iter()
            .map(|(&node, &value)| CounterElement { node, value })
    }

    /// Returns the accumulated value for one node (0 if it never added).
    #[must_use]
    pub fn get(&self, node: &NodeId) -> u64 {
        self.additions.get(node).copied().unwrap_or(0)
    }

    /// Adds `value` to `node`'s accumulator.
    #[must_use]
    pub fn add(&self, value: u64, node: NodeId) -> Self {
        let mut next = self.clone();
        let entry = next.additions.entry(node).or_insert(0);
        *entry = entry.saturating_add(value);
        next
    }

    /// Returns the counter value.
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.additions
            .values()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }
}

impl Merge for GCounter {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (&node, &count) in &other.additions {
            let entry = merged.additions.entry(node).or_insert(0);
            *entry = (*entry).max(count);
        }
        merged
    }
}

impl Commutative for GCounter {
    type Operation = CounterOperation;

    fn apply(&self, operation: &CounterOperation) -> CrdtResult<Self> {
        Ok(self.add(operation.value, operation.origin_node))
    }
}

impl PartialEq for GCounter {
    fn eq(&self, other: &Self) -> bool {
        // Absent nodes count as 0 so an explicit zero entry is not a difference.
        self.additions
            .keys()
            .chain(other.additions.keys())
            .all(|node| self.get(node) == other.get(node))
    }
}

impl Eq for GCounter {}

/// A Positive-Negative Counter.
///
/// Each node tracks its own increments and decrements independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNCounter {
    additions: GCounter,
    subtractions: GCounter,
}

impl PNCounter {
    /// Creates a new counter with value 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a counter from its two stored element collections.
    #[must_use]
    pub fn from_elements(
        additions: impl IntoIterator<Item = CounterElement>,
        subtractions: impl IntoIterator<Item = CounterElement>,
    ) -> Self {
        Self {
            additions: GCounter::from_elements(additions),
            subtractions: GCounter::from_elements(subtractions),
        }
    }

    /// The grow-only counter of additions.
    #[must_use]
    pub fn additions(&self) -> &GCounter {
        &self.additions
    }

    /// The grow-only counter of subtractions.
    #[must_use]
    pub fn subtractions(&self) -> &GCounter {
        &self.subtractions
    }

    /// Increments the counter by `value` on behalf of `node`.
    #[must_use]
    pub fn add(&self, value: u64, node: NodeId) -> Self {
        Self {
            additions: self.additions.add(value, node),
            subtractions: self.subtractions.clone(),
        }
    }

    /// Decrements the counter by `value` on behalf of `node`.
    #[must_use]
    pub fn subtract(&self, value: u64, node: NodeId) -> Self {
        Self {
            additions: self.additions.clone(),
            subtractions: self.subtractions.add(value, node),
        }
    }

    /// Returns the current counter value (may be negative).
    #[must_use]
    pub fn sum(&self) -> i64 {
        let diff = i128::from(self.additions.sum()) - i128::from(self.subtractions.sum());
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }
}

impl Merge for PNCounter {
    fn merge(&self, other: &Self) -> Self {
        Self {
            additions: self.additions.merge(&other.additions),
            subtractions: self.subtractions.merge(&other.subtractions),
        }
    }
}

impl Commutative for PNCounter {
    type Operation = CounterDelta;

    fn apply(&self, operation: &CounterDelta) -> CrdtResult<Self> {
        Ok(match operation {
            CounterDelta::Increment(op) => self.add(op.value, op.origin_node),
            CounterDelta::Decrement(op) => self.subtract(op.value, op.origin_node),
        })
    }
}
