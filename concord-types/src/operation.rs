//! Operation wire shapes for operation-based replication.
//!
//! In operation-based mode a replica does not ship its whole state. It ships
//! one delta, and every other replica replays it. The shapes here are pure
//! data; applying them is the job of each CRDT's `Commutative` impl.
//!
//! Operations travel inside an [`Envelope`], which gives every delta a unique
//! id so receivers that cannot trust exactly-once delivery can drop replays.

use crate::{ElementId, NodeId, OperationId, Tag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A counter delta: `value` units attributed to `origin_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterOperation {
    pub value: u64,
    pub origin_node: NodeId,
}

impl CounterOperation {
    #[must_use]
    pub const fn new(value: u64, origin_node: NodeId) -> Self {
        Self { value, origin_node }
    }
}

/// The two deltas a positive-negative counter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum CounterDelta {
    Increment(CounterOperation),
    Decrement(CounterOperation),
}

/// A tagged set delta payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOperation<T> {
    pub value: T,
    pub tag: Tag,
}

impl<T> SetOperation<T> {
    #[must_use]
    pub fn new(value: T, tag: Tag) -> Self {
        Self { value, tag }
    }
}

/// A tagged set delta payload that also carries a causal stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedSetOperation<T, S> {
    pub value: T,
    pub tag: Tag,
    pub stamp: S,
}

impl<T, S> StampedSetOperation<T, S> {
    #[must_use]
    pub fn new(value: T, tag: Tag, stamp: S) -> Self {
        Self { value, tag, stamp }
    }
}

/// An untagged value with a causal stamp (last-writer-wins sets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedValue<T, S> {
    pub value: T,
    pub stamp: S,
}

impl<T, S> StampedValue<T, S> {
    #[must_use]
    pub fn new(value: T, stamp: S) -> Self {
        Self { value, stamp }
    }
}

/// A set delta. Families without an update operation treat `Update` as `Add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum SetDelta<O> {
    Add(O),
    Update(O),
    Remove(O),
}

/// A whole-value register delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum RegisterDelta<T, S> {
    Assign { value: T, stamp: S, writer: NodeId },
    Remove { value: T, stamp: S, writer: NodeId },
}

/// A patch-based register delta: a partial document for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOperation<S, D = serde_json::Value> {
    pub element_id: ElementId,
    pub patch: D,
    pub stamp: S,
}

impl<S, D> RegisterOperation<S, D> {
    #[must_use]
    pub fn new(element_id: ElementId, patch: D, stamp: S) -> Self {
        Self {
            element_id,
            patch,
            stamp,
        }
    }
}

/// The unit of replication: one operation plus the metadata needed to
/// de-duplicate it on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<O> {
    /// Unique identifier for this delivery.
    pub id: OperationId,
    /// The replica that issued the operation.
    pub origin: NodeId,
    /// The operation to replay.
    pub operation: O,
}

impl<O> Envelope<O> {
    /// Wraps an operation under a freshly minted id.
    #[must_use]
    pub fn new(origin: NodeId, operation: O) -> Self {
        Self {
            id: OperationId::new(),
            origin,
            operation,
        }
    }
}

impl<O: Serialize> Envelope<O> {
    /// Encodes the envelope as JSON bytes for a transport.
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<O: DeserializeOwned> Envelope<O> {
    /// Decodes an envelope received from a transport.
    pub fn from_json(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
