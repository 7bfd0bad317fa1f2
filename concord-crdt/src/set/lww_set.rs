//! Last-Writer-Wins element set.
//!
//! Adds and removes are stamped per value. A value is present when its newest
//! add is newer than its newest remove; on an exact stamp tie the remove wins.

use super::seq_map;
use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use crate::stamp::CausalStamp;
use concord_types::{SetDelta, StampedValue, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A value with the stamp of its newest add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWSetElement<T, S> {
    pub value: T,
    pub stamp: S,
}

/// A value with the stamp and kind of its newest write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWOptimizedSetElement<T, S> {
    pub value: T,
    pub stamp: S,
    pub removed: bool,
}

/// Keeps the greater of the stored and the incoming stamp for `value`.
fn keep_latest<T: Ord, S: CausalStamp>(stamps: &mut BTreeMap<T, S>, value: T, stamp: S) {
    match stamps.get_mut(&value) {
        Some(existing) => {
            if stamp.arbitrate(existing) == Ordering::Greater {
                *existing = stamp;
            }
        }
        None => {
            stamps.insert(value, stamp);
        }
    }
}

/// A Last-Writer-Wins set with separate add and remove stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, S: Serialize",
    deserialize = "T: Deserialize<'de>, S: Deserialize<'de>"
))]
pub struct LWWSet<T: Ord + Clone, S: CausalStamp = Timestamp> {
    #[serde(with = "seq_map")]
    adds: BTreeMap<T, S>,
    #[serde(with = "seq_map")]
    removes: BTreeMap<T, S>,
}

impl<T: Ord + Clone, S: CausalStamp> Default for LWWSet<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, S: CausalStamp> LWWSet<T, S> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }

    /// Rebuilds a set from stored collections.
    #[must_use]
    pub fn from_parts(
        adds: impl IntoIterator<Item = LWWSetElement<T, S>>,
        removes: impl IntoIterator<Item = LWWSetElement<T, S>>,
    ) -> Self {
        let mut set = Self::new();
        for e in adds {
            keep_latest(&mut set.adds, e.value, e.stamp);
        }
        for e in removes {
            keep_latest(&mut set.removes, e.value, e.stamp);
        }
        set
    }

    /// Newest add of every value ever added.
    pub fn adds(&self) -> impl Iterator<Item = LWWSetElement<&T, &S>> {
        self.adds
            .iter()
            .map(|(value, stamp)| LWWSetElement { value, stamp })
    }

    /// Newest remove of every value ever removed.
    pub fn removes(&self) -> impl Iterator<Item = LWWSetElement<&T, &S>> {
        self.removes
            .iter()
            .map(|(value, stamp)| LWWSetElement { value, stamp })
    }

    #[must_use]
    pub fn add(&self, value: T, stamp: S) -> Self {
        let mut next = self.clone();
        keep_latest(&mut next.adds, value, stamp);
        next
    }

    /// Records a stamped remove. Unlike the tagged sets, a value does not
    /// have to be observed to be removed; the stamp alone decides.
    #[must_use]
    pub fn remove(&self, value: T, stamp: S) -> Self {
        let mut next = self.clone();
        keep_latest(&mut next.removes, value, stamp);
        next
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.adds
            .get(value)
            .is_some_and(|added| self.is_live(value, added))
    }

    fn is_live(&self, value: &T, added: &S) -> bool {
        self.removes
            .get(value)
            .is_none_or(|removed| added.arbitrate(removed) == Ordering::Greater)
    }

    /// Returns the visible values, in value order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.adds
            .iter()
            .filter(|(value, added)| self.is_live(value, added))
            .map(|(value, _)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().next().is_none()
    }
}

impl<T: Ord + Clone, S: CausalStamp> Merge for LWWSet<T, S> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (value, stamp) in &other.adds {
            keep_latest(&mut merged.adds, value.clone(), stamp.clone());
        }
        for (value, stamp) in &other.removes {
            keep_latest(&mut merged.removes, value.clone(), stamp.clone());
        }
        merged
    }
}

impl<T: Ord + Clone, S: CausalStamp> Commutative for LWWSet<T, S> {
    type Operation = SetDelta<StampedValue<T, S>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) | SetDelta::Update(op) => {
                self.add(op.value.clone(), op.stamp.clone())
            }
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.stamp.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry<S> {
    stamp: S,
    removed: bool,
}

impl<S: CausalStamp> Entry<S> {
    fn precedence(&self, other: &Self) -> Ordering {
        self.stamp
            .arbitrate(&other.stamp)
            .then(self.removed.cmp(&other.removed))
    }
}

/// A Last-Writer-Wins set keeping only the newest write per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, S: Serialize",
    deserialize = "T: Deserialize<'de>, S: Deserialize<'de>"
))]
pub struct LWWSetOptimized<T: Ord + Clone, S: CausalStamp = Timestamp> {
    #[serde(with = "seq_map")]
    elements: BTreeMap<T, Entry<S>>,
}

impl<T: Ord + Clone, S: CausalStamp> Default for LWWSetOptimized<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, S: CausalStamp> LWWSetOptimized<T, S> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = LWWOptimizedSetElement<T, S>>) -> Self {
        let mut set = Self::new();
        for e in elements {
            set.write(
                e.value,
                Entry {
                    stamp: e.stamp,
                    removed: e.removed,
                },
            );
        }
        set
    }

    /// All stored elements, including tombstones.
    pub fn raw_elements(&self) -> impl Iterator<Item = LWWOptimizedSetElement<&T, &S>> {
        self.elements
            .iter()
            .map(|(value, entry)| LWWOptimizedSetElement {
                value,
                stamp: &entry.stamp,
                removed: entry.removed,
            })
    }

    fn write(&mut self, value: T, entry: Entry<S>) {
        match self.elements.get_mut(&value) {
            Some(existing) => {
                if entry.precedence(existing) == Ordering::Greater {
                    *existing = entry;
                }
            }
            None => {
                self.elements.insert(value, entry);
            }
        }
    }

    #[must_use]
    pub fn add(&self, value: T, stamp: S) -> Self {
        let mut next = self.clone();
        next.write(
            value,
            Entry {
                stamp,
                removed: false,
            },
        );
        next
    }

    #[must_use]
    pub fn remove(&self, value: T, stamp: S) -> Self {
        let mut next = self.clone();
        next.write(
            value,
            Entry {
                stamp,
                removed: true,
            },
        );
        next
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.elements.get(value).is_some_and(|e| !e.removed)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.elements
            .iter()
            .filter(|(_, entry)| !entry.removed)
            .map(|(value, _)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().next().is_none()
    }
}

impl<T: Ord + Clone, S: CausalStamp> Merge for LWWSetOptimized<T, S> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (value, entry) in &other.elements {
            merged.write(value.clone(), entry.clone());
        }
        merged
    }
}

impl<T: Ord + Clone, S: CausalStamp> Commutative for LWWSetOptimized<T, S> {
    type Operation = SetDelta<StampedValue<T, S>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) | SetDelta::Update(op) => {
                self.add(op.value.clone(), op.stamp.clone())
            }
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.stamp.clone()),
        })
    }
}
