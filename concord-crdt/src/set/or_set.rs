//! Observed-Remove Set (OR-Set / Add-Wins Set).
//!
//! Each add is witnessed by a unique [`Tag`]. A remove names the exact
//! `(value, tag)` pair it observed, so it can only cancel adds its issuer had
//! already seen. A value is in the set while at least one of its adds is not
//! matched by a remove; a concurrent add with a fresh tag therefore survives
//! the remove (add-wins).
//!
//! Use cases:
//! - Membership lists edited on several devices
//! - Labels attached to a record

use super::seq_map;
use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use concord_types::{SetDelta, SetOperation, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One add of `value`, witnessed by `tag`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ORSetElement<T> {
    pub value: T,
    pub tag: Tag,
}

impl<T> ORSetElement<T> {
    #[must_use]
    pub fn new(value: T, tag: Tag) -> Self {
        Self { value, tag }
    }
}

/// An Observed-Remove Set with separate add and remove collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ORSet<T: Ord + Clone> {
    adds: BTreeSet<ORSetElement<T>>,
    /// Removed pairs (tombstones). Always a subset of `adds`.
    removes: BTreeSet<ORSetElement<T>>,
}

impl<T: Ord + Clone> Default for ORSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> ORSet<T> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: BTreeSet::new(),
            removes: BTreeSet::new(),
        }
    }

    /// Rebuilds a set from stored collections. Removes without a matching add
    /// are dropped.
    #[must_use]
    pub fn from_parts(
        adds: impl IntoIterator<Item = ORSetElement<T>>,
        removes: impl IntoIterator<Item = ORSetElement<T>>,
    ) -> Self {
        let adds: BTreeSet<_> = adds.into_iter().collect();
        let removes = removes.into_iter().filter(|r| adds.contains(r)).collect();
        Self { adds, removes }
    }

    /// All recorded adds, removed or not.
    #[must_use]
    pub fn adds(&self) -> &BTreeSet<ORSetElement<T>> {
        &self.adds
    }

    /// All recorded removes.
    #[must_use]
    pub fn removes(&self) -> &BTreeSet<ORSetElement<T>> {
        &self.removes
    }

    /// Records an add of `value` witnessed by `tag`.
    #[must_use]
    pub fn add(&self, value: T, tag: Tag) -> Self {
        let mut next = self.clone();
        next.adds.insert(ORSetElement::new(value, tag));
        next
    }

    /// Records a remove of the `(value, tag)` add. A no-op unless that exact
    /// add has been observed.
    #[must_use]
    pub fn remove(&self, value: T, tag: Tag) -> Self {
        let element = ORSetElement::new(value, tag);
        if !self.adds.contains(&element) {
            return self.clone();
        }
        let mut next = self.clone();
        next.removes.insert(element);
        next
    }

    /// Returns true if the set contains `value`.
    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.elements().any(|e| &e.value == value)
    }

    /// Returns the live (added and not removed) elements.
    pub fn elements(&self) -> impl Iterator<Item = &ORSetElement<T>> {
        self.adds.difference(&self.removes)
    }

    /// Returns the distinct visible values.
    #[must_use]
    pub fn values(&self) -> BTreeSet<&T> {
        self.elements().map(|e| &e.value).collect()
    }

    /// Returns the live tags of `value`; removing all of them removes the
    /// value as observed by this replica.
    #[must_use]
    pub fn tags_for(&self, value: &T) -> Vec<Tag> {
        self.elements()
            .filter(|e| &e.value == value)
            .map(|e| e.tag)
            .collect()
    }

    /// Returns the number of distinct visible values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }
}

impl<T: Ord + Clone> Merge for ORSet<T> {
    fn merge(&self, other: &Self) -> Self {
        let adds: BTreeSet<_> = self.adds.union(&other.adds).cloned().collect();
        let removes = self
            .removes
            .union(&other.removes)
            .filter(|r| adds.contains(*r))
            .cloned()
            .collect();
        Self { adds, removes }
    }
}

impl<T: Ord + Clone> Commutative for ORSet<T> {
    type Operation = SetDelta<SetOperation<T>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) | SetDelta::Update(op) => self.add(op.value.clone(), op.tag),
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.tag),
        })
    }
}

/// An element of the single-stream OR-Set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ORSetOptimizedElement<T> {
    pub value: T,
    pub tag: Tag,
    pub removed: bool,
}

/// An Observed-Remove Set storing one flagged element per `(value, tag)`
/// pair instead of parallel add and remove collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct ORSetOptimized<T: Ord + Clone> {
    /// Removed flag per observed add.
    #[serde(with = "seq_map")]
    elements: BTreeMap<ORSetElement<T>, bool>,
}

impl<T: Ord + Clone> Default for ORSetOptimized<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> ORSetOptimized<T> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
        }
    }

    /// Rebuilds a set from stored elements. A pair stored more than once is
    /// removed if any copy is.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = ORSetOptimizedElement<T>>) -> Self {
        let mut set = Self::new();
        for element in elements {
            set.absorb(ORSetElement::new(element.value, element.tag), element.removed);
        }
        set
    }

    /// All stored elements, including tombstones.
    pub fn raw_elements(&self) -> impl Iterator<Item = ORSetOptimizedElement<T>> {
        self.elements
            .iter()
            .map(|(element, &removed)| ORSetOptimizedElement {
                value: element.value.clone(),
                tag: element.tag,
                removed,
            })
    }

    /// Records an add of `value` witnessed by `tag`. Re-adding a removed pair
    /// does not revive it.
    #[must_use]
    pub fn add(&self, value: T, tag: Tag) -> Self {
        let element = ORSetElement::new(value, tag);
        if self.elements.contains_key(&element) {
            return self.clone();
        }
        let mut next = self.clone();
        next.elements.insert(element, false);
        next
    }

    /// Flags the `(value, tag)` add as removed. A no-op unless it was observed.
    #[must_use]
    pub fn remove(&self, value: T, tag: Tag) -> Self {
        let element = ORSetElement::new(value, tag);
        match self.elements.get(&element) {
            Some(false) => {
                let mut next = self.clone();
                next.elements.insert(element, true);
                next
            }
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.elements().any(|e| &e.value == value)
    }

    /// Returns the live elements.
    pub fn elements(&self) -> impl Iterator<Item = &ORSetElement<T>> {
        self.elements
            .iter()
            .filter(|(_, removed)| !**removed)
            .map(|(element, _)| element)
    }

    #[must_use]
    pub fn values(&self) -> BTreeSet<&T> {
        self.elements().map(|e| &e.value).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }

    /// Folds one pair in; a removal on either side sticks.
    fn absorb(&mut self, element: ORSetElement<T>, removed: bool) {
        *self.elements.entry(element).or_insert(false) |= removed;
    }
}

impl<T: Ord + Clone> Merge for ORSetOptimized<T> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (element, &removed) in &other.elements {
            merged.absorb(element.clone(), removed);
        }
        merged
    }
}

impl<T: Ord + Clone> Commutative for ORSetOptimized<T> {
    type Operation = SetDelta<SetOperation<T>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) | SetDelta::Update(op) => self.add(op.value.clone(), op.tag),
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.tag),
        })
    }
}
