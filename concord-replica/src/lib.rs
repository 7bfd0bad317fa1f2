//! Replica service for Concord.
//!
//! The CRDT core in `concord-crdt` is pure: every operation maps a state to a
//! new state. This crate adds the plumbing a running node needs around it:
//!
//! - [`Repository`]: where a replica's state is loaded from and persisted to
//!   ([`MemoryRepository`], [`JsonFileRepository`])
//! - [`Replica`]: one logical replica, serializing load → compute → persist
//!   under a mutex and de-duplicating replayed operation envelopes
//! - [`ReplicaRegistry`]: hands out one shared replica per instance key
//! - [`ReplicaConfig`]: node identity and de-duplication settings

mod config;
mod error;
mod registry;
mod replica;
mod repository;

pub use config::{ReplicaConfig, DEFAULT_SEEN_LOG_CAPACITY};
pub use error::{ReplicaError, ReplicaResult};
pub use registry::ReplicaRegistry;
pub use replica::{ApplyOutcome, Replica};
pub use repository::{JsonFileRepository, MemoryRepository, Repository};
