//! Vector Clock for causality tracking.
//!
//! A vector clock records, per node, how many events of that node a replica
//! has observed. Comparing two clocks tells whether one snapshot causally
//! precedes the other or whether they are concurrent. Every "is this write
//! newer?" decision made by the stamped registers and sets goes through
//! [`VectorClock::compare`].
//!
//! Clocks are value objects: every operation returns a new clock.

use crate::merge::Merge;
use concord_types::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Causality relationship between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CausalOrder {
    /// Both clocks hold exactly the same entries.
    Same,
    /// First clock happened before second.
    Before,
    /// First clock happened after second.
    After,
    /// Neither clock happened before the other.
    Concurrent,
}

impl CausalOrder {
    /// The order seen from the other side of the comparison.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            other => other,
        }
    }
}

impl From<Ordering> for CausalOrder {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Before,
            Ordering::Equal => Self::Same,
            Ordering::Greater => Self::After,
        }
    }
}

/// A Vector Clock for tracking causality across nodes.
///
/// Entries are kept in [`NodeId`] order so iteration, serialization and the
/// arbitration order are deterministic on every replica.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    clocks: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    /// Creates a new empty vector clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clocks: BTreeMap::new(),
        }
    }

    /// Creates a clock whose domain is `nodes`, each at counter 0.
    #[must_use]
    pub fn for_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        nodes.into_iter().map(|node| (node, 0)).collect()
    }

    /// Returns the counter for a node, or `None` if the node is outside the
    /// clock's domain.
    #[must_use]
    pub fn get(&self, node: &NodeId) -> Option<u64> {
        self.clocks.get(node).copied()
    }

    /// Returns true if the node is part of the clock's domain.
    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.clocks.contains_key(node)
    }

    /// Returns the nodes in the clock, in node order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.clocks.keys()
    }

    /// Returns all entries, in node order.
    pub fn entries(&self) -> impl Iterator<Item = (&NodeId, &u64)> {
        self.clocks.iter()
    }

    /// Returns the number of nodes in the clock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Returns true if the clock has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Sum of all counters.
    #[must_use]
    pub fn total(&self) -> u128 {
        self.clocks.values().map(|&c| u128::from(c)).sum()
    }

    /// Returns a clock with `node` advanced by one.
    ///
    /// Incrementing a node the clock does not know is a no-op: increment never
    /// widens the clock's domain. Use [`VectorClock::with_node`] to bring a new
    /// replica in first.
    #[must_use]
    pub fn increment(&self, node: NodeId) -> Self {
        let mut next = self.clone();
        if let Some(counter) = next.clocks.get_mut(&node) {
            *counter = counter.saturating_add(1);
        }
        next
    }

    /// Returns a clock that includes `node`, starting it at 0 if absent.
    #[must_use]
    pub fn with_node(&self, node: NodeId) -> Self {
        let mut next = self.clone();
        next.clocks.entry(node).or_insert(0);
        next
    }

    /// Returns a clock without `node` (e.g. when a replica is retired).
    #[must_use]
    pub fn prune(&self, node: &NodeId) -> Self {
        let mut next = self.clone();
        next.clocks.remove(node);
        next
    }

    /// Compares this clock with another to determine causal ordering.
    ///
    /// Nodes known to only one side count as extra knowledge on that side,
    /// not as a zero on the other. Extra knowledge on both sides is always
    /// concurrent.
    #[must_use]
    pub fn compare(&self, other: &Self) -> CausalOrder {
        let only_left = self.clocks.keys().any(|n| !other.clocks.contains_key(n));
        let only_right = other.clocks.keys().any(|n| !self.clocks.contains_key(n));

        if only_left && only_right {
            return CausalOrder::Concurrent;
        }

        let mut order = CausalOrder::Same;
        for (node, left) in &self.clocks {
            let Some(right) = other.clocks.get(node) else {
                continue;
            };
            order = match left.cmp(right) {
                Ordering::Equal => order,
                Ordering::Less if order == CausalOrder::After => return CausalOrder::Concurrent,
                Ordering::Less => CausalOrder::Before,
                Ordering::Greater if order == CausalOrder::Before => {
                    return CausalOrder::Concurrent;
                }
                Ordering::Greater => CausalOrder::After,
            };
        }

        if only_left {
            if order == CausalOrder::Before {
                CausalOrder::Concurrent
            } else {
                CausalOrder::After
            }
        } else if only_right {
            if order == CausalOrder::After {
                CausalOrder::Concurrent
            } else {
                CausalOrder::Before
            }
        } else {
            order
        }
    }

    /// Returns true if this clock is causally before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Before
    }

    /// Returns true if this clock is causally after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::After
    }

    /// Returns true if neither clock happened before the other.
    #[must_use]
    pub fn is_concurrent_with(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Concurrent
    }

    /// A total order that extends [`VectorClock::compare`]: if `a` is before
    /// `b` then `a.arbitrate(b)` is `Less`. Concurrent clocks get a fixed,
    /// replica-independent order.
    ///
    /// Ordering by `(total, len, entries)` works because a causal successor
    /// either carries a larger total or, with an equal total, strictly more
    /// (zero-valued) entries.
    #[must_use]
    pub fn arbitrate(&self, other: &Self) -> Ordering {
        self.total()
            .cmp(&other.total())
            .then_with(|| self.len().cmp(&other.len()))
            .then_with(|| self.clocks.iter().cmp(other.clocks.iter()))
    }
}

impl Merge for VectorClock {
    /// Pointwise maximum over the union of both domains.
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (node, &time) in &other.clocks {
            let entry = merged.clocks.entry(*node).or_insert(time);
            if time > *entry {
                *entry = time;
            }
        }
        merged
    }
}

impl FromIterator<(NodeId, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (NodeId, u64)>>(iter: I) -> Self {
        Self {
            clocks: iter.into_iter().collect(),
        }
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Same
    }
}

impl Eq for VectorClock {}

impl PartialOrd for VectorClock {
    /// The causal partial order; concurrent clocks are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.compare(other) {
            CausalOrder::Same => Some(Ordering::Equal),
            CausalOrder::Before => Some(Ordering::Less),
            CausalOrder::After => Some(Ordering::Greater),
            CausalOrder::Concurrent => None,
        }
    }
}
