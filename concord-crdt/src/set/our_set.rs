//! Observed-Updated-Removed Set (OUR-Set).
//!
//! An OR-Set whose elements can also be updated in place. Every element is
//! identified by its [`Tag`] and carries a causal stamp; for each tag the
//! newest write wins, whether it is an add, an update or a remove. A remove is
//! therefore not final: an update stamped after it brings the tag back, and a
//! remove stamped after that hides it again.
//!
//! Precedence between two writes to one tag is, in order:
//! 1. the stamps' arbitration order (causal order, extended to a total order),
//! 2. removal (a tombstone beats an add carrying the identical stamp),
//! 3. the value itself (greater wins).

use crate::error::CrdtResult;
use crate::merge::{Commutative, Merge};
use crate::stamp::CausalStamp;
use concord_types::{SetDelta, StampedSetOperation, Tag, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A stamped, possibly removed, tagged element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OURSetElement<T, S> {
    pub value: T,
    pub tag: Tag,
    pub stamp: S,
    pub removed: bool,
}

impl<T: Ord, S: CausalStamp> OURSetElement<T, S> {
    #[must_use]
    pub fn new(value: T, tag: Tag, stamp: S) -> Self {
        Self {
            value,
            tag,
            stamp,
            removed: false,
        }
    }

    #[must_use]
    pub fn tombstone(value: T, tag: Tag, stamp: S) -> Self {
        Self {
            value,
            tag,
            stamp,
            removed: true,
        }
    }

    /// Precedence of `self` over another write to the same tag.
    #[must_use]
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.stamp
            .arbitrate(&other.stamp)
            .then(self.removed.cmp(&other.removed))
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// Stores `candidate` under its tag unless the current entry takes precedence.
fn keep_newest<T: Ord + Clone, S: CausalStamp>(
    elements: &mut BTreeMap<Tag, OURSetElement<T, S>>,
    candidate: OURSetElement<T, S>,
) {
    match elements.get_mut(&candidate.tag) {
        Some(existing) => {
            if candidate.precedence(existing) == Ordering::Greater {
                *existing = candidate;
            }
        }
        None => {
            elements.insert(candidate.tag, candidate);
        }
    }
}

fn union_newest<T: Ord + Clone, S: CausalStamp>(
    left: &BTreeMap<Tag, OURSetElement<T, S>>,
    right: &BTreeMap<Tag, OURSetElement<T, S>>,
) -> BTreeMap<Tag, OURSetElement<T, S>> {
    let mut merged = left.clone();
    for element in right.values() {
        keep_newest(&mut merged, element.clone());
    }
    merged
}

/// An OUR-Set with separate add and remove collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OURSet<T: Ord + Clone, S: CausalStamp = Timestamp> {
    adds: BTreeMap<Tag, OURSetElement<T, S>>,
    removes: BTreeMap<Tag, OURSetElement<T, S>>,
}

impl<T: Ord + Clone, S: CausalStamp> Default for OURSet<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, S: CausalStamp> OURSet<T, S> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }

    /// Rebuilds a set from stored collections. Removes of unobserved tags are
    /// dropped.
    #[must_use]
    pub fn from_parts(
        adds: impl IntoIterator<Item = OURSetElement<T, S>>,
        removes: impl IntoIterator<Item = OURSetElement<T, S>>,
    ) -> Self {
        let mut set = Self::new();
        for element in adds {
            keep_newest(&mut set.adds, OURSetElement { removed: false, ..element });
        }
        for element in removes {
            if set.adds.contains_key(&element.tag) {
                keep_newest(&mut set.removes, OURSetElement { removed: true, ..element });
            }
        }
        set
    }

    /// The newest add or update of every tag ever added.
    pub fn adds(&self) -> impl Iterator<Item = &OURSetElement<T, S>> {
        self.adds.values()
    }

    /// The newest remove of every removed tag.
    pub fn removes(&self) -> impl Iterator<Item = &OURSetElement<T, S>> {
        self.removes.values()
    }

    /// Adds `value` under `tag`. If the tag is already known this is an
    /// [`OURSet::update`].
    #[must_use]
    pub fn add(&self, value: T, tag: Tag, stamp: S) -> Self {
        if self.adds.contains_key(&tag) {
            return self.update(value, tag, stamp);
        }
        let mut next = self.clone();
        next.adds.insert(tag, OURSetElement::new(value, tag, stamp));
        next
    }

    /// Replaces the element under `tag` unless the stored one takes
    /// precedence. Updating a tag that was never added is a no-op.
    #[must_use]
    pub fn update(&self, value: T, tag: Tag, stamp: S) -> Self {
        if !self.adds.contains_key(&tag) {
            return self.clone();
        }
        let mut next = self.clone();
        keep_newest(&mut next.adds, OURSetElement::new(value, tag, stamp));
        next
    }

    /// Records a stamped remove of an observed tag.
    #[must_use]
    pub fn remove(&self, value: T, tag: Tag, stamp: S) -> Self {
        if !self.adds.contains_key(&tag) {
            return self.clone();
        }
        let mut next = self.clone();
        keep_newest(&mut next.removes, OURSetElement::tombstone(value, tag, stamp));
        next
    }

    fn is_live(&self, element: &OURSetElement<T, S>) -> bool {
        self.removes
            .get(&element.tag)
            .is_none_or(|removed| element.stamp.arbitrate(&removed.stamp) == Ordering::Greater)
    }

    /// Returns the live elements, in tag order.
    pub fn elements(&self) -> impl Iterator<Item = &OURSetElement<T, S>> {
        self.adds.values().filter(|e| self.is_live(e))
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.elements().any(|e| &e.value == value)
    }

    #[must_use]
    pub fn values(&self) -> BTreeSet<&T> {
        self.elements().map(|e| &e.value).collect()
    }

    /// Returns the live element under `tag`, if any.
    #[must_use]
    pub fn get(&self, tag: &Tag) -> Option<&OURSetElement<T, S>> {
        self.adds.get(tag).filter(|e| self.is_live(e))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }
}

impl<T: Ord + Clone, S: CausalStamp> Merge for OURSet<T, S> {
    fn merge(&self, other: &Self) -> Self {
        let adds = union_newest(&self.adds, &other.adds);
        let mut removes = union_newest(&self.removes, &other.removes);
        removes.retain(|tag, _| adds.contains_key(tag));
        Self { adds, removes }
    }
}

impl<T: Ord + Clone, S: CausalStamp> Commutative for OURSet<T, S> {
    type Operation = SetDelta<StampedSetOperation<T, S>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) => self.add(op.value.clone(), op.tag, op.stamp.clone()),
            SetDelta::Update(op) => self.update(op.value.clone(), op.tag, op.stamp.clone()),
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.tag, op.stamp.clone()),
        })
    }
}

/// An OUR-Set storing the single newest write per tag, tombstones included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OURSetOptimized<T: Ord + Clone, S: CausalStamp = Timestamp> {
    elements: BTreeMap<Tag, OURSetElement<T, S>>,
}

impl<T: Ord + Clone, S: CausalStamp> Default for OURSetOptimized<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, S: CausalStamp> OURSetOptimized<T, S> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = OURSetElement<T, S>>) -> Self {
        let mut set = Self::new();
        for element in elements {
            keep_newest(&mut set.elements, element);
        }
        set
    }

    /// All stored elements, including tombstones.
    pub fn raw_elements(&self) -> impl Iterator<Item = &OURSetElement<T, S>> {
        self.elements.values()
    }

    #[must_use]
    pub fn add(&self, value: T, tag: Tag, stamp: S) -> Self {
        if self.elements.contains_key(&tag) {
            return self.update(value, tag, stamp);
        }
        let mut next = self.clone();
        next.elements.insert(tag, OURSetElement::new(value, tag, stamp));
        next
    }

    #[must_use]
    pub fn update(&self, value: T, tag: Tag, stamp: S) -> Self {
        if !self.elements.contains_key(&tag) {
            return self.clone();
        }
        let mut next = self.clone();
        keep_newest(&mut next.elements, OURSetElement::new(value, tag, stamp));
        next
    }

    #[must_use]
    pub fn remove(&self, value: T, tag: Tag, stamp: S) -> Self {
        if !self.elements.contains_key(&tag) {
            return self.clone();
        }
        let mut next = self.clone();
        keep_newest(&mut next.elements, OURSetElement::tombstone(value, tag, stamp));
        next
    }

    /// Returns the live elements, in tag order.
    pub fn elements(&self) -> impl Iterator<Item = &OURSetElement<T, S>> {
        self.elements.values().filter(|e| !e.removed)
    }

    #[must_use]
    pub fn lookup(&self, value: &T) -> bool {
        self.elements().any(|e| &e.value == value)
    }

    #[must_use]
    pub fn values(&self) -> BTreeSet<&T> {
        self.elements().map(|e| &e.value).collect()
    }

    #[must_use]
    pub fn get(&self, tag: &Tag) -> Option<&OURSetElement<T, S>> {
        self.elements.get(tag).filter(|e| !e.removed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }
}

impl<T: Ord + Clone, S: CausalStamp> Merge for OURSetOptimized<T, S> {
    fn merge(&self, other: &Self) -> Self {
        Self {
            elements: union_newest(&self.elements, &other.elements),
        }
    }
}

impl<T: Ord + Clone, S: CausalStamp> Commutative for OURSetOptimized<T, S> {
    type Operation = SetDelta<StampedSetOperation<T, S>>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        Ok(match operation {
            SetDelta::Add(op) => self.add(op.value.clone(), op.tag, op.stamp.clone()),
            SetDelta::Update(op) => self.update(op.value.clone(), op.tag, op.stamp.clone()),
            SetDelta::Remove(op) => self.remove(op.value.clone(), op.tag, op.stamp.clone()),
        })
    }
}
