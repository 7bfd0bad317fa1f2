//! Core type definitions for Concord.
//!
//! This crate defines the leaf types every replicated data type builds on:
//! - Node, tag, element and operation identifiers (UUID v7)
//! - Scalar logical timestamps
//! - Operation wire shapes for operation-based replication
//!
//! Vector clocks and the CRDTs themselves live in `concord-crdt`.

mod ids;
mod operation;
mod timestamp;

pub use ids::{ElementId, NodeId, OperationId, Tag};
pub use operation::{
    CounterDelta, CounterOperation, Envelope, RegisterDelta, RegisterOperation, SetDelta,
    SetOperation, StampedSetOperation, StampedValue,
};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from parsing identifiers and decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
