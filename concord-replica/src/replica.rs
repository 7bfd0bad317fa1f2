//! A single logical replica: a CRDT state behind a repository and a lock.
//!
//! Every operation is a read-merge-write: load the current state, compute its
//! successor with the pure CRDT core, persist the successor. The replica's
//! mutex is held across the whole sequence so concurrent callers never lose
//! each other's updates.

use crate::config::ReplicaConfig;
use crate::error::{ReplicaError, ReplicaResult};
use crate::repository::Repository;
use concord_crdt::{Commutative, Merge};
use concord_types::{Envelope, NodeId, OperationId};
use std::collections::{HashSet, VecDeque};
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Bounded record of applied operation ids.
#[derive(Debug)]
struct SeenLog {
    ids: HashSet<OperationId>,
    order: VecDeque<OperationId>,
    capacity: usize,
}

impl SeenLog {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn contains(&self, id: &OperationId) -> bool {
        self.ids.contains(id)
    }

    fn record(&mut self, id: OperationId) {
        if self.capacity == 0 || !self.ids.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.ids.remove(&evicted);
            }
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Result of [`Replica::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome<C> {
    /// The operation was replayed; carries the new state.
    Applied(C),
    /// The operation id was already applied and the envelope was dropped.
    Duplicate,
}

/// A locked, persisted CRDT replica.
pub struct Replica<C, R> {
    config: ReplicaConfig,
    repository: R,
    seen: Mutex<SeenLog>,
    _state: PhantomData<fn() -> C>,
}

impl<C, R> Replica<C, R>
where
    C: Clone + Default,
    R: Repository<C>,
{
    /// Creates a replica over `repository`.
    pub fn new(config: ReplicaConfig, repository: R) -> Self {
        info!("Created replica for node {}", config.node);
        Self {
            seen: Mutex::new(SeenLog::new(config.seen_log_capacity)),
            config,
            repository,
            _state: PhantomData,
        }
    }

    /// The local node identity.
    pub fn node(&self) -> NodeId {
        self.config.node
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Number of operation ids currently remembered for de-duplication.
    pub fn seen_operations(&self) -> ReplicaResult<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> ReplicaResult<MutexGuard<'_, SeenLog>> {
        self.seen.lock().map_err(|_| {
            warn!("Replica lock for node {} poisoned", self.config.node);
            ReplicaError::LockPoisoned
        })
    }

    fn load(&self) -> ReplicaResult<C> {
        Ok(self.repository.load()?.unwrap_or_default())
    }

    /// A snapshot of the current state. An empty repository yields the
    /// default (empty) state.
    pub fn state(&self) -> ReplicaResult<C> {
        let _guard = self.lock()?;
        self.load()
    }

    /// Replaces the state with `f(current)` and persists it.
    pub fn update<F>(&self, f: F) -> ReplicaResult<C>
    where
        F: FnOnce(&C) -> C,
    {
        self.try_update(|state| Ok::<_, ReplicaError>(f(state)))
    }

    /// Like [`Replica::update`] for fallible transitions. On error nothing is
    /// persisted.
    pub fn try_update<F, E>(&self, f: F) -> ReplicaResult<C>
    where
        F: FnOnce(&C) -> Result<C, E>,
        ReplicaError: From<E>,
    {
        let _guard = self.lock()?;
        let next = f(&self.load()?)?;
        self.repository.persist(&next)?;
        debug!("Updated replica state for node {}", self.config.node);
        Ok(next)
    }

    /// Joins a remote state into the local one.
    pub fn merge(&self, remote: &C) -> ReplicaResult<C>
    where
        C: Merge,
    {
        self.update(|state| state.merge(remote))
    }

    /// Replays one operation envelope.
    ///
    /// With de-duplication on, an envelope whose id was already applied is
    /// dropped. Operations that fail to apply are not recorded, so a corrected
    /// retry with the same id is still accepted.
    pub fn apply(&self, envelope: &Envelope<C::Operation>) -> ReplicaResult<ApplyOutcome<C>>
    where
        C: Commutative,
    {
        let mut seen = self.lock()?;
        let dedupe = self.config.deduplicate_operations;
        if dedupe && seen.contains(&envelope.id) {
            debug!(
                "Skipping duplicate operation {} from {}",
                envelope.id, envelope.origin
            );
            return Ok(ApplyOutcome::Duplicate);
        }

        let next = self.load()?.apply(&envelope.operation)?;
        self.repository.persist(&next)?;
        if dedupe {
            seen.record(envelope.id);
        }
        debug!("Applied operation {} from {}", envelope.id, envelope.origin);
        Ok(ApplyOutcome::Applied(next))
    }
}
