//! Replicated sets.
//!
//! Every set keeps raw element collections and derives its visible membership
//! from them; membership itself is never stored. The families differ in how
//! an add and a remove of the same value are reconciled:
//!
//! - [`GSet`]: no removes at all.
//! - [`TwoPhaseSet`]: a removed value can never come back.
//! - [`ORSet`] / [`ORSetOptimized`]: each add carries a unique [`Tag`]; a
//!   remove only cancels the tags it observed, so a concurrent add wins.
//! - [`OURSet`] / [`OURSetOptimized`]: tagged elements that can also be
//!   updated in place; the higher causal stamp decides between add, update
//!   and remove of one tag.
//! - [`LWWSet`] / [`LWWSetOptimized`]: untagged; the latest add or remove of a
//!   value wins.
//!
//! The `Optimized` variants keep a single element stream with a `removed`
//! flag instead of separate add and remove collections. They are observably
//! identical to their split counterparts.
//!
//! [`Tag`]: concord_types::Tag

mod gset;
mod lww_set;
mod or_set;
mod our_set;
mod two_phase;

pub use gset::GSet;
pub use lww_set::{LWWOptimizedSetElement, LWWSet, LWWSetElement, LWWSetOptimized};
pub use or_set::{ORSet, ORSetElement, ORSetOptimized, ORSetOptimizedElement};
pub use our_set::{OURSet, OURSetElement, OURSetOptimized};
pub use two_phase::TwoPhaseSet;

/// Serializes a map as a sequence of `(key, value)` pairs, for maps whose keys
/// are arbitrary payload values rather than strings.
pub(crate) mod seq_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
