//! Last-Writer-Wins Register (LWW-Register).
//!
//! A register stores a single value. Each write carries a causal stamp and
//! the node that wrote it. A local or replayed write replaces the current
//! element only if its stamp is causally after the current one. Writes with
//! the same stamp are ordered by writer (smaller node first), then tombstone
//! over value, then the greater value, so every replica keeps the same one
//! whatever order the writes arrive in.
//!
//! With a [`VectorClock`] stamp a write concurrent with the current element
//! is ignored by `assign`; state merges still need a winner and use the
//! stamp's arbitration order.
//!
//! Removing is just another stamped write that sets the tombstone flag, so a
//! later assign brings the register back. A register holds a single element,
//! so a remove always targets it; the tombstone keeps the value the remover
//! observed.
//!
//! [`VectorClock`]: crate::VectorClock

use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use crate::stamp::CausalStamp;
use crate::vector_clock::CausalOrder;
use concord_types::{NodeId, RegisterDelta, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The single current write of a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterElement<T, S> {
    pub value: T,
    pub stamp: S,
    /// Node that issued the write; breaks ties between equal stamps.
    pub writer: NodeId,
    pub removed: bool,
}

impl<T: Ord, S: CausalStamp> RegisterElement<T, S> {
    /// Orders two writes carrying the same stamp. Greater wins.
    fn tie_break(&self, other: &Self) -> Ordering {
        other
            .writer
            .cmp(&self.writer)
            .then(self.removed.cmp(&other.removed))
            .then_with(|| self.value.cmp(&other.value))
    }

    /// True if `candidate` replaces this element.
    fn yields_to(&self, candidate: &Self) -> bool {
        match candidate.stamp.causal_cmp(&self.stamp) {
            CausalOrder::After => true,
            CausalOrder::Same => candidate.tie_break(self) == Ordering::Greater,
            CausalOrder::Before | CausalOrder::Concurrent => false,
        }
    }

    /// Total precedence used by state merges. Greater wins.
    fn precedence(&self, other: &Self) -> Ordering {
        self.stamp
            .arbitrate(&other.stamp)
            .then_with(|| self.tie_break(other))
    }
}

/// A Last-Writer-Wins Register, generic over its stamp type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LWWRegister<T, S: CausalStamp = Timestamp> {
    element: Option<RegisterElement<T, S>>,
}

impl<T, S: CausalStamp> Default for LWWRegister<T, S> {
    fn default() -> Self {
        Self { element: None }
    }
}

impl<T: Clone + Ord, S: CausalStamp> LWWRegister<T, S> {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a register holding one write.
    #[must_use]
    pub fn with_value(value: T, stamp: S, writer: NodeId) -> Self {
        Self {
            element: Some(RegisterElement {
                value,
                stamp,
                writer,
                removed: false,
            }),
        }
    }

    /// Rebuilds a register from its stored element.
    #[must_use]
    pub fn from_element(element: Option<RegisterElement<T, S>>) -> Self {
        Self { element }
    }

    /// The current element, tombstoned or not.
    #[must_use]
    pub fn element(&self) -> Option<&RegisterElement<T, S>> {
        self.element.as_ref()
    }

    /// The visible value: `None` when empty or removed.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.element
            .as_ref()
            .filter(|e| !e.removed)
            .map(|e| &e.value)
    }

    /// The stamp of the current element.
    #[must_use]
    pub fn stamp(&self) -> Option<&S> {
        self.element.as_ref().map(|e| &e.stamp)
    }

    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.element.as_ref().is_some_and(|e| e.removed)
    }

    fn write(&self, candidate: RegisterElement<T, S>) -> Self {
        match &self.element {
            Some(current) if !current.yields_to(&candidate) => self.clone(),
            _ => Self {
                element: Some(candidate),
            },
        }
    }

    /// Writes `value` if `(stamp, writer)` wins over the current element.
    #[must_use]
    pub fn assign(&self, value: T, stamp: S, writer: NodeId) -> Self {
        self.write(RegisterElement {
            value,
            stamp,
            writer,
            removed: false,
        })
    }

    /// Tombstones the register if `(stamp, writer)` wins over the current
    /// element, under the same rule as [`LWWRegister::assign`]. `value` is the
    /// value the remover observed.
    #[must_use]
    pub fn remove(&self, value: &T, stamp: S, writer: NodeId) -> Self {
        self.write(RegisterElement {
            value: value.clone(),
            stamp,
            writer,
            removed: true,
        })
    }
}

impl<T: Clone + Ord, S: CausalStamp> Merge for LWWRegister<T, S> {
    fn merge(&self, other: &Self) -> Self {
        match (&self.element, &other.element) {
            (Some(mine), Some(theirs)) => {
                if theirs.precedence(mine) == Ordering::Greater {
                    other.clone()
                } else {
                    self.clone()
                }
            }
            (None, Some(_)) => other.clone(),
            _ => self.clone(),
        }
    }
}

impl<T: Clone + Ord, S: CausalStamp> Commutative for LWWRegister<T, S> {
    type Operation = RegisterDelta<T, S>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            RegisterDelta::Assign {
                value,
                stamp,
                writer,
            } => self.assign(value.clone(), stamp.clone(), *writer),
            RegisterDelta::Remove {
                value,
                stamp,
                writer,
            } => self.remove(value, stamp.clone(), *writer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_clock::VectorClock;

    fn node(n: u8) -> NodeId {
        NodeId::from_uuid(uuid::Uuid::from_bytes([
            n, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]))
    }

    fn ts(v: i64) -> Timestamp {
        Timestamp::new(v)
    }

    #[test]
    fn empty_register_accepts_any_write() {
        let reg = LWWRegister::new().assign("a", ts(0), node(1));
        assert_eq!(reg.value(), Some(&"a"));
    }

    #[test]
    fn newer_stamp_replaces() {
        let reg = LWWRegister::with_value("a", ts(1), node(1)).assign("b", ts(2), node(2));
        assert_eq!(reg.value(), Some(&"b"));
    }

    #[test]
    fn older_stamp_is_ignored() {
        let reg = LWWRegister::with_value("a", ts(5), node(1)).assign("b", ts(2), node(2));
        assert_eq!(reg.value(), Some(&"a"));
    }

    #[test]
    fn equal_stamps_prefer_smaller_writer() {
        let first = LWWRegister::new()
            .assign("n1", ts(3), node(1))
            .assign("n2", ts(3), node(2));
        let second = LWWRegister::new()
            .assign("n2", ts(3), node(2))
            .assign("n1", ts(3), node(1));
        assert_eq!(first.value(), Some(&"n1"));
        assert_eq!(second.value(), Some(&"n1"));
    }

    #[test]
    fn remove_targets_the_single_element() {
        let reg = LWWRegister::with_value("a", ts(1), node(1)).remove(&"b", ts(2), node(1));
        assert!(reg.is_removed());
        assert_eq!(reg.element().map(|e| e.value), Some("b"));
    }

    #[test]
    fn stale_remove_is_ignored() {
        let reg = LWWRegister::with_value("a", ts(4), node(1));
        assert!(!reg.remove(&"a", ts(3), node(1)).is_removed());
        assert!(!reg.remove(&"a", ts(4), node(2)).is_removed());
        assert!(reg.remove(&"a", ts(4), node(0)).is_removed());
    }

    #[test]
    fn remove_on_empty_register_leaves_tombstone() {
        let reg = LWWRegister::<&str>::new().remove(&"a", ts(1), node(1));
        assert!(reg.is_removed());
        assert_eq!(reg.value(), None);
    }

    #[test]
    fn same_stamp_and_writer_breaks_tie_on_value() {
        let a = LWWRegister::with_value(1, ts(2), node(1));
        let b = LWWRegister::with_value(2, ts(2), node(1));
        assert_eq!(a.merge(&b).value(), Some(&2));
        assert_eq!(b.merge(&a).value(), Some(&2));
        assert_eq!(a.assign(2, ts(2), node(1)), b.assign(1, ts(2), node(1)));
    }

    #[test]
    fn later_assign_resurrects_removed_register() {
        let reg = LWWRegister::with_value("a", ts(1), node(1))
            .remove(&"a", ts(2), node(1))
            .assign("b", ts(3), node(2));
        assert!(!reg.is_removed());
        assert_eq!(reg.value(), Some(&"b"));
    }

    #[test]
    fn vector_clock_concurrent_assign_is_ignored() {
        let base = VectorClock::for_nodes([node(1), node(2)]);
        let left = base.increment(node(1));
        let right = base.increment(node(2));
        let reg = LWWRegister::with_value(1, left, node(1)).assign(2, right, node(2));
        assert_eq!(reg.value(), Some(&1));
    }

    #[test]
    fn vector_clock_concurrent_merge_is_symmetric() {
        let base = VectorClock::for_nodes([node(1), node(2)]);
        let a = LWWRegister::with_value(1, base.increment(node(1)), node(1));
        let b = LWWRegister::with_value(2, base.increment(node(2)), node(2));
        assert_eq!(a.merge(&b), b.merge(&a));
    }
}
