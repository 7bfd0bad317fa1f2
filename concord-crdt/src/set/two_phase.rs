//! Two-Phase Set.
//!
//! A value goes through at most two phases: added, then removed. Once removed
//! it stays removed on every replica, even if it is added again.

use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use concord_types::SetDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set where removal wins permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPhaseSet<T: Ord + Clone> {
    adds: BTreeSet<T>,
    removes: BTreeSet<T>,
}

impl<T: Ord + Clone> Default for TwoPhaseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> TwoPhaseSet<T> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: BTreeSet::new(),
            removes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn add(&self, value: T) -> Self {
        let mut next = self.clone();
        next.adds.insert(value);
        next
    }

    /// Removes a value that is currently present. Removing a value that was
    /// never added is a no-op.
    #[must_use]
    pub fn remove(&self, value: T) -> Self {
        if !self.adds.contains(&value) {
            return self.clone();
        }
        let mut next = self.clone();
        next.removes.insert(value);
        next
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.adds.contains(value) && !self.removes.contains(value)
    }

    /// Returns the visible values.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.adds.difference(&self.removes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every value ever removed (tombstones).
    #[must_use]
    pub fn removes(&self) -> &BTreeSet<T> {
        &self.removes
    }
}

impl<T: Ord + Clone> Merge for TwoPhaseSet<T> {
    fn merge(&self, other: &Self) -> Self {
        Self {
            adds: self.adds.union(&other.adds).cloned().collect(),
            removes: self.removes.union(&other.removes).cloned().collect(),
        }
    }
}

impl<T: Ord + Clone> Commutative for TwoPhaseSet<T> {
    type Operation = SetDelta<T>;

    fn apply(&self, operation: &SetDelta<T>) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(value) | SetDelta::Update(value) => self.add(value.clone()),
            SetDelta::Remove(value) => self.remove(value.clone()),
        })
    }
}
