//! Where replica state lives between operations.
//!
//! A repository stores one whole CRDT state. Every replica operation loads it,
//! computes the successor and persists the successor in full; there are no
//! partial writes.

use crate::error::{ReplicaError, ReplicaResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Storage for a single replica's state.
pub trait Repository<C>: Send + Sync {
    /// Returns the stored state, or `None` if nothing was persisted yet.
    fn load(&self) -> ReplicaResult<Option<C>>;

    /// Replaces the stored state.
    fn persist(&self, state: &C) -> ReplicaResult<()>;
}

/// In-memory repository.
#[derive(Debug)]
pub struct MemoryRepository<C> {
    slot: Mutex<Option<C>>,
}

impl<C> Default for MemoryRepository<C> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<C> MemoryRepository<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that already holds `state`.
    pub fn with_state(state: C) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
        }
    }
}

impl<C: Clone + Send> Repository<C> for MemoryRepository<C> {
    fn load(&self) -> ReplicaResult<Option<C>> {
        let slot = self.slot.lock().map_err(|_| ReplicaError::LockPoisoned)?;
        Ok(slot.clone())
    }

    fn persist(&self, state: &C) -> ReplicaResult<()> {
        let mut slot = self.slot.lock().map_err(|_| ReplicaError::LockPoisoned)?;
        *slot = Some(state.clone());
        Ok(())
    }
}

/// Repository storing the state as a JSON document on disk.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash never leaves a half-written state behind.
#[derive(Debug)]
pub struct JsonFileRepository<C> {
    path: PathBuf,
    _state: PhantomData<fn() -> C>,
}

impl<C> JsonFileRepository<C> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _state: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<C: Serialize + DeserializeOwned> Repository<C> for JsonFileRepository<C> {
    fn load(&self) -> ReplicaResult<Option<C>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Unreadable state file {}: {}", self.path.display(), e);
                Err(e.into())
            }
        }
    }

    fn persist(&self, state: &C) -> ReplicaResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&temp, &self.path)?;
        debug!("Persisted state to {}", self.path.display());
        Ok(())
    }
}
