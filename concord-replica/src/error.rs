//! Error types for the replica service.

use concord_crdt::CrdtError;
use thiserror::Error;

/// Result type for replica operations.
pub type ReplicaResult<T> = Result<T, ReplicaError>;

/// Errors that can occur while loading, updating or persisting a replica.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation could not be merged into the current state.
    #[error("merge error: {0}")]
    Crdt(#[from] CrdtError),

    /// A thread panicked while holding the replica lock.
    #[error("replica lock poisoned")]
    LockPoisoned,
}
