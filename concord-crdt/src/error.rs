//! Error types for the CRDT core.
//!
//! Counters, sets and whole-value registers never fail. The only fallible
//! path is structural merging of patch documents.

use thiserror::Error;

/// Result type for CRDT operations.
pub type CrdtResult<T> = Result<T, CrdtError>;

/// Errors that can occur while applying an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrdtError {
    /// A patch must be a document with fields, not a bare value.
    #[error("patch is not an object")]
    PatchNotObject,

    /// The patch tried to merge an object into a scalar field, or a scalar
    /// into an object field.
    #[error("incompatible patch at {path}: cannot merge {patch} into {target}")]
    IncompatiblePatch {
        path: String,
        target: &'static str,
        patch: &'static str,
    },
}
