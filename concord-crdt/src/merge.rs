//! The two replication modes every CRDT in this crate supports.
//!
//! A state-based (convergent) replica ships its whole state and the receiver
//! joins it with [`Merge::merge`]. An operation-based (commutative) replica
//! ships one delta and the receiver replays it with [`Commutative::apply`].
//!
//! `merge` must form a join-semilattice:
//! - Commutativity: `a.merge(b) == b.merge(a)`
//! - Associativity: `a.merge(b).merge(c) == a.merge(b.merge(c))`
//! - Idempotence:  `a.merge(a) == a`

use crate::error::CrdtResult;

/// State-based replication: join two replica states.
pub trait Merge {
    /// Least upper bound of `self` and `other`.
    #[must_use]
    fn merge(&self, other: &Self) -> Self;
}

/// Operation-based replication: replay one delta issued by some replica.
///
/// Replays commute as long as deltas are delivered in causal order. They are
/// not idempotent in general; receivers that may see a delta twice must
/// de-duplicate before calling [`Commutative::apply`].
pub trait Commutative: Sized {
    /// The delta shipped between replicas.
    type Operation;

    /// Returns the state after replaying `operation`.
    fn apply(&self, operation: &Self::Operation) -> CrdtResult<Self>;
}

/// Joins every state yielded by `states`, starting from `init`.
pub fn merge_all<'a, C, I>(init: C, states: I) -> C
where
    C: Merge + 'a,
    I: IntoIterator<Item = &'a C>,
{
    states.into_iter().fold(init, |acc, state| acc.merge(state))
}
