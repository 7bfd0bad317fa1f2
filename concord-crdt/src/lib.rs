//! Causality tracking and CRDT merge algebra for Concord.
//!
//! This crate provides Conflict-free Replicated Data Types:
//!
//! - [`VectorClock`]: causality tracking across nodes
//! - [`GCounter`], [`PNCounter`]: grow-only and increment/decrement counters
//! - [`GSet`], [`TwoPhaseSet`], [`ORSet`], [`OURSet`], [`LWWSet`]: set family,
//!   most with a single-map `*Optimized` variant
//! - [`LWWRegister`]: last-writer-wins register for single values
//! - [`PatchRegisterMap`]: keyed registers updated by partial documents
//!
//! Every type is an immutable value: operations return a new instance. Each
//! supports both replication modes, state merging through [`Merge`] and
//! operation replay through [`Commutative`].
//!
//! All merges satisfy the following properties:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! These properties ensure that replicas will converge to the same state
//! regardless of the order in which states are received.

mod counter;
mod error;
mod merge;
mod patch;
mod register;
pub mod set;
mod stamp;
mod vector_clock;

pub use counter::{CounterElement, GCounter, PNCounter};
pub use error::{CrdtError, CrdtResult};
pub use merge::{merge_all, Commutative, Merge};
pub use patch::{PatchElement, PatchRegisterMap, StructuralMerge};
pub use register::{LWWRegister, RegisterElement};
pub use set::{
    GSet, LWWOptimizedSetElement, LWWSet, LWWSetElement, LWWSetOptimized, ORSet, ORSetElement,
    ORSetOptimized, ORSetOptimizedElement, OURSet, OURSetElement, OURSetOptimized, TwoPhaseSet,
};
pub use stamp::CausalStamp;
pub use vector_clock::{CausalOrder, VectorClock};

pub use concord_types::{
    CounterDelta, CounterOperation, ElementId, NodeId, RegisterDelta, RegisterOperation, SetDelta,
    SetOperation, StampedSetOperation, StampedValue, Tag, Timestamp,
};
