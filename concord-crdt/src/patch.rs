//! Patch-based registers.
//!
//! Instead of shipping a whole value on every write, a writer ships a partial
//! document holding only the fields it changed. The receiver merges those
//! fields into the element's current value when the write's stamp strictly
//! dominates the element's stamp. One `apply` is atomic; two writers patching
//! different fields of the same element concurrently are still ordered as
//! whole writes.
//!
//! Merging documents is delegated to [`StructuralMerge`], implemented here
//! for [`serde_json::Value`].

use crate::error::{CrdtError, CrdtResult};
use crate::merge::{Commutative, Merge};
use crate::stamp::CausalStamp;
use concord_types::{ElementId, RegisterOperation, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Field-by-field merging of a partial document into a full one.
pub trait StructuralMerge: Sized {
    /// A bare document carrying only its element id.
    fn skeleton(id: ElementId) -> Self;

    /// Returns `self` with every field present in `patch` overwritten.
    fn merge_patch(&self, patch: &Self) -> CrdtResult<Self>;

    /// A deterministic order between two documents, only used to break exact
    /// stamp ties during state merges.
    fn tie_break(&self, other: &Self) -> Ordering;
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn merge_object(
    target: &mut Map<String, Value>,
    patch: &Map<String, Value>,
    path: &str,
) -> CrdtResult<()> {
    for (key, incoming) in patch {
        let field_path = format!("{path}/{key}");
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_object(existing, nested, &field_path)?;
            }
            // Null is an explicit overwrite, and a null field accepts anything.
            (Some(existing), incoming) if existing.is_null() || incoming.is_null() => {
                *existing = incoming.clone();
            }
            (Some(existing), incoming) if existing.is_object() != incoming.is_object() => {
                return Err(CrdtError::IncompatiblePatch {
                    path: field_path,
                    target: kind(existing),
                    patch: kind(incoming),
                });
            }
            (Some(existing), incoming) => *existing = incoming.clone(),
            (None, incoming) => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
    Ok(())
}

impl StructuralMerge for Value {
    fn skeleton(id: ElementId) -> Self {
        serde_json::json!({ "id": id })
    }

    fn merge_patch(&self, patch: &Self) -> CrdtResult<Self> {
        let Value::Object(fields) = patch else {
            return Err(CrdtError::PatchNotObject);
        };
        let mut merged = self.clone();
        match &mut merged {
            Value::Object(target) => merge_object(target, fields, "")?,
            other => {
                return Err(CrdtError::IncompatiblePatch {
                    path: String::from("/"),
                    target: kind(other),
                    patch: "object",
                });
            }
        }
        Ok(merged)
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

/// One patch-based register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchElement<S, D = Value> {
    pub id: ElementId,
    pub value: D,
    pub stamp: S,
    pub removed: bool,
}

impl<S: CausalStamp, D: StructuralMerge> PatchElement<S, D> {
    /// True if a write stamped `stamp` may change this element.
    fn accepts(&self, stamp: &S) -> bool {
        stamp.dominates(&self.stamp)
    }

    fn precedence(&self, other: &Self) -> Ordering {
        self.stamp
            .arbitrate(&other.stamp)
            .then(self.removed.cmp(&other.removed))
            .then_with(|| self.value.tie_break(&other.value))
    }
}

/// A keyed collection of patch-based last-writer-wins registers.
///
/// Each [`ElementId`] is an independent register. Writes to an id not seen
/// before are accepted: the patch is merged into a skeleton carrying only the
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRegisterMap<S: CausalStamp = Timestamp, D: StructuralMerge = Value> {
    elements: BTreeMap<ElementId, PatchElement<S, D>>,
}

impl<S: CausalStamp, D: StructuralMerge> Default for PatchRegisterMap<S, D> {
    fn default() -> Self {
        Self {
            elements: BTreeMap::new(),
        }
    }
}

impl<S: CausalStamp, D: StructuralMerge + Clone> PatchRegisterMap<S, D> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a map from stored elements.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = PatchElement<S, D>>) -> Self {
        let mut map = Self::new();
        for element in elements {
            map.keep_newest(element);
        }
        map
    }

    /// All stored elements, including removed ones.
    pub fn elements(&self) -> impl Iterator<Item = &PatchElement<S, D>> {
        self.elements.values()
    }

    /// The visible value of one register.
    #[must_use]
    pub fn value(&self, id: &ElementId) -> Option<&D> {
        self.elements
            .get(id)
            .filter(|e| !e.removed)
            .map(|e| &e.value)
    }

    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&PatchElement<S, D>> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Merges `patch` into element `id` if `stamp` strictly dominates the
    /// element's stamp. Concurrent writes leave the element unchanged.
    pub fn assign(&self, id: ElementId, patch: &D, stamp: S) -> CrdtResult<Self> {
        let current = match self.elements.get(&id) {
            Some(existing) if !existing.accepts(&stamp) => return Ok(self.clone()),
            Some(existing) => existing.value.clone(),
            None => D::skeleton(id),
        };
        let value = current.merge_patch(patch)?;
        let mut next = self.clone();
        next.elements.insert(
            id,
            PatchElement {
                id,
                value,
                stamp,
                removed: false,
            },
        );
        Ok(next)
    }

    /// Tombstones element `id` under the same strict-dominance rule as
    /// [`PatchRegisterMap::assign`]. Unknown ids are left alone.
    #[must_use]
    pub fn remove(&self, id: ElementId, stamp: S) -> Self {
        match self.elements.get(&id) {
            Some(existing) if existing.accepts(&stamp) => {
                let mut next = self.clone();
                next.elements.insert(
                    id,
                    PatchElement {
                        id,
                        value: existing.value.clone(),
                        stamp,
                        removed: true,
                    },
                );
                next
            }
            _ => self.clone(),
        }
    }

    fn keep_newest(&mut self, candidate: PatchElement<S, D>) {
        match self.elements.get_mut(&candidate.id) {
            Some(existing) => {
                if candidate.precedence(existing) == Ordering::Greater {
                    *existing = candidate;
                }
            }
            None => {
                self.elements.insert(candidate.id, candidate);
            }
        }
    }
}

impl<S: CausalStamp, D: StructuralMerge + Clone> Merge for PatchRegisterMap<S, D> {
    /// Whole-element last-writer-wins per id.
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for element in other.elements.values() {
            merged.keep_newest(element.clone());
        }
        merged
    }
}

impl<S: CausalStamp, D: StructuralMerge + Clone> Commutative for PatchRegisterMap<S, D> {
    type Operation = RegisterOperation<S, D>;

    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self> {
        self.assign(operation.element_id, &operation.patch, operation.stamp.clone())
    }
}
