//! One shared [`Replica`] per logical instance key.
//!
//! Two callers asking for the same key always get the same `Arc`, and
//! therefore the same lock around the same repository.

use crate::config::ReplicaConfig;
use crate::error::{ReplicaError, ReplicaResult};
use crate::replica::Replica;
use crate::repository::Repository;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Slots<K, C, R> = HashMap<K, Arc<Replica<C, R>>>;

/// A registry of replicas keyed by instance.
pub struct ReplicaRegistry<K, C, R> {
    config: ReplicaConfig,
    replicas: Mutex<Slots<K, C, R>>,
}

impl<K, C, R> ReplicaRegistry<K, C, R>
where
    K: Eq + Hash + Clone + Debug,
    C: Clone + Default,
    R: Repository<C>,
{
    /// Creates an empty registry. Every replica it creates shares `config`.
    pub fn new(config: ReplicaConfig) -> Self {
        Self {
            config,
            replicas: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    fn slots(&self) -> ReplicaResult<MutexGuard<'_, Slots<K, C, R>>> {
        self.replicas.lock().map_err(|_| ReplicaError::LockPoisoned)
    }

    /// Returns the replica for `key`, creating it with a repository from
    /// `make_repository` on first use.
    pub fn get_or_create<F>(&self, key: K, make_repository: F) -> ReplicaResult<Arc<Replica<C, R>>>
    where
        F: FnOnce(&K) -> R,
    {
        let mut slots = self.slots()?;
        if let Some(replica) = slots.get(&key) {
            return Ok(Arc::clone(replica));
        }
        debug!("Creating replica for {:?}", key);
        let replica = Arc::new(Replica::new(self.config.clone(), make_repository(&key)));
        slots.insert(key, Arc::clone(&replica));
        Ok(replica)
    }

    /// Returns the replica for `key` if it was created.
    pub fn get(&self, key: &K) -> ReplicaResult<Option<Arc<Replica<C, R>>>> {
        Ok(self.slots()?.get(key).cloned())
    }

    /// Drops the registry's handle for `key`. Existing handles stay usable.
    pub fn remove(&self, key: &K) -> ReplicaResult<Option<Arc<Replica<C, R>>>> {
        Ok(self.slots()?.remove(key))
    }

    pub fn len(&self) -> ReplicaResult<usize> {
        Ok(self.slots()?.len())
    }

    pub fn is_empty(&self) -> ReplicaResult<bool> {
        Ok(self.slots()?.is_empty())
    }
}
