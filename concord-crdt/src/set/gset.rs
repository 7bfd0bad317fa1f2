//! Grow-only set.

use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set that only supports adds. Merge is set union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSet<T: Ord + Clone> {
    adds: BTreeSet<T>,
}

impl<T: Ord + Clone> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> GSet<T> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: BTreeSet::new(),
        }
    }

    /// Returns a set that also contains `value`.
    #[must_use]
    pub fn add(&self, value: T) -> Self {
        let mut next = self.clone();
        next.adds.insert(value);
        next
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.adds.contains(value)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.adds.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty()
    }
}

impl<T: Ord + Clone> Merge for GSet<T> {
    fn merge(&self, other: &Self) -> Self {
        Self {
            adds: self.adds.union(&other.adds).cloned().collect(),
        }
    }
}

impl<T: Ord + Clone> Commutative for GSet<T> {
    type Operation = T;

    fn apply(&self, value: &T) -> CrdtResult<Self> {
        Ok(self.add(value.clone()))
    }
}

impl<T: Ord + Clone> FromIterator<T> for GSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            adds: iter.into_iter().collect(),
        }
    }
}
