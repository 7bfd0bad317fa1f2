//! Replica configuration.

use crate::error::ReplicaResult;
use concord_types::NodeId;
use serde::{Deserialize, Serialize};

/// Default number of operation ids remembered for de-duplication.
pub const DEFAULT_SEEN_LOG_CAPACITY: usize = 10_000;

/// Configuration for a replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplicaConfig {
    /// Identity of the local node.
    pub node: NodeId,
    /// Drop envelopes whose operation id was already applied.
    pub deduplicate_operations: bool,
    /// How many applied operation ids to remember. Oldest are evicted first.
    pub seen_log_capacity: usize,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            node: NodeId::new(),
            deduplicate_operations: true,
            seen_log_capacity: DEFAULT_SEEN_LOG_CAPACITY,
        }
    }
}

impl ReplicaConfig {
    /// Default configuration for a known node.
    #[must_use]
    pub fn for_node(node: NodeId) -> Self {
        Self {
            node,
            ..Self::default()
        }
    }

    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ReplicaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
