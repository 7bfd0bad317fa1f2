//! N-node convergence tests.
//!
//! These tests simulate multi-node topologies:
//! 1. Gossip-based selective sync (ring partners, not full mesh)
//! 2. Chain/transitive convergence (A→B→C achieves global convergence)
//! 3. Interleaved write+merge (writes happening during sync rounds)
//! 4. Partitions that heal
//! 5. State-based and operation-based replication agreeing

use concord_crdt::set::{LWWSet, ORSet, OURSet};
use concord_crdt::{
    merge_all, CausalOrder, Commutative, LWWRegister, Merge, PNCounter, PatchRegisterMap,
    VectorClock,
};
use concord_types::{
    CounterDelta, CounterOperation, ElementId, NodeId, RegisterOperation, SetDelta,
    StampedSetOperation, Tag, Timestamp,
};
use serde_json::json;
use std::collections::BTreeSet;

/// Deterministic node IDs for reproducibility.
fn node(n: u8) -> NodeId {
    NodeId::from_uuid(uuid::Uuid::from_bytes([
        n, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ]))
}

fn tag(n: u16) -> Tag {
    let [hi, lo] = n.to_be_bytes();
    Tag::from_uuid(uuid::Uuid::from_bytes([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, hi, lo,
    ]))
}

/// Ring gossip: each round, replica `i` merges a snapshot of `i + round`.
fn gossip<C: Merge + Clone>(replicas: &mut [C], rounds: usize) {
    let n = replicas.len();
    for round in 1..=rounds {
        let snapshots = replicas.to_vec();
        for (i, replica) in replicas.iter_mut().enumerate() {
            *replica = replica.merge(&snapshots[(i + round) % n]);
        }
    }
}

fn assert_converged<C: Merge + PartialEq + std::fmt::Debug>(replicas: &[C]) {
    for (i, replica) in replicas.iter().enumerate().skip(1) {
        assert_eq!(replica, &replicas[0], "replica {i} diverged");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 1. GOSSIP / SELECTIVE SYNC
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn gossip_orset_20_nodes_add_wins() {
    let n: u8 = 20;
    let mut sets: Vec<ORSet<String>> = (0..n)
        .map(|i| {
            ORSet::new()
                .add(format!("unique_{i}"), tag(u16::from(i)))
                .add("shared".into(), tag(100 + u16::from(i)))
        })
        .collect();

    // Every 5th node removes its own "shared" before seeing anyone else's tags.
    for i in (0..usize::from(n)).step_by(5) {
        let own = tag(100 + u16::try_from(i).unwrap());
        sets[i] = sets[i].remove("shared".into(), own);
    }

    gossip(&mut sets, usize::from(n));
    assert_converged(&sets);

    for i in 0..n {
        assert!(sets[0].lookup(&format!("unique_{i}")), "missing unique_{i}");
    }
    assert!(sets[0].lookup(&"shared".to_string()));
    assert_eq!(sets[0].tags_for(&"shared".to_string()).len(), 16);
}

#[test]
fn gossip_vector_clocks_50_nodes() {
    let n: u8 = 50;
    let all: Vec<NodeId> = (0..n).map(node).collect();
    let mut clocks: Vec<VectorClock> = all
        .iter()
        .map(|&me| VectorClock::for_nodes(all.iter().copied()).increment(me))
        .collect();

    gossip(&mut clocks, usize::from(n));
    assert_converged(&clocks);
    for &id in &all {
        assert_eq!(clocks[0].get(&id), Some(1));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 2. CHAIN / TRANSITIVE CONVERGENCE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn chain_sync_10_nodes_linear_propagation() {
    let n = 10;
    let mut counters: Vec<PNCounter> = (0..n)
        .map(|i| PNCounter::new().add(i as u64 + 1, node(i as u8)))
        .collect();

    for i in 0..n - 1 {
        counters[i + 1] = counters[i + 1].merge(&counters[i]);
    }
    for i in (0..n - 1).rev() {
        counters[i] = counters[i].merge(&counters[i + 1]);
    }

    let expected = (n * (n + 1) / 2) as i64;
    for (i, c) in counters.iter().enumerate() {
        assert_eq!(c.sum(), expected, "counter {i} has wrong value");
    }
}

#[test]
fn vector_clock_causality_preserved_through_chain() {
    let nodes = [node(0), node(1), node(2)];
    let a = VectorClock::for_nodes(nodes).increment(nodes[0]);
    let b = VectorClock::for_nodes(nodes).merge(&a).increment(nodes[1]);
    let c = VectorClock::for_nodes(nodes).merge(&b).increment(nodes[2]);

    assert_eq!(a.compare(&b), CausalOrder::Before);
    assert_eq!(b.compare(&c), CausalOrder::Before);
    assert_eq!(a.compare(&c), CausalOrder::Before);
    assert_eq!(c.compare(&a), CausalOrder::After);
}

// ═══════════════════════════════════════════════════════════════════════════
// 3. INTERLEAVED WRITES AND MERGES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn our_set_writes_during_gossip_rounds() {
    let n = 8;
    let mut sets: Vec<OURSet<u32>> = (0..n)
        .map(|i| OURSet::new().add(i as u32, tag(i as u16), Timestamp::new(1)))
        .collect();

    for round in 1..=n {
        // Replica `round - 1` rewrites everything it currently sees.
        let writer = round - 1;
        let seen: Vec<_> = sets[writer].elements().map(|e| e.tag).collect();
        for t in seen {
            sets[writer] =
                sets[writer].update(round as u32 * 100, t, Timestamp::new(round as i64 + 1));
        }
        gossip(&mut sets, 1);
    }
    gossip(&mut sets, n);
    assert_converged(&sets);
    assert_eq!(sets[0].elements().count(), n);
}

#[test]
fn lww_register_50_nodes_same_stamp_deterministic_winner() {
    let n: u8 = 50;
    let registers: Vec<LWWRegister<u8>> = (0..n)
        .map(|i| LWWRegister::with_value(i, Timestamp::new(42), node(i)))
        .collect();

    let forward = merge_all(LWWRegister::new(), &registers);
    let backward = merge_all(LWWRegister::new(), registers.iter().rev());
    assert_eq!(forward, backward);
    assert_eq!(forward.value(), Some(&0));
}

// ═══════════════════════════════════════════════════════════════════════════
// 4. PARTITIONS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn partitioned_teams_converge_after_heal() {
    let team_a: Vec<NodeId> = (0..5).map(node).collect();
    let team_b: Vec<NodeId> = (5..10).map(node).collect();

    let base = LWWSet::new().add("roadmap", Timestamp::new(1));
    let mut a: Vec<LWWSet<&str>> = vec![base.clone(); team_a.len()];
    let mut b: Vec<LWWSet<&str>> = vec![base; team_b.len()];

    a[0] = a[0].remove("roadmap", Timestamp::new(3));
    a[1] = a[1].add("budget", Timestamp::new(2));
    b[0] = b[0].add("roadmap", Timestamp::new(4));
    b[3] = b[3].add("hiring", Timestamp::new(2));

    gossip(&mut a, 5);
    gossip(&mut b, 5);
    assert_converged(&a);
    assert_converged(&b);
    assert!(!a[0].lookup(&"roadmap"));

    let mut everyone: Vec<_> = a.into_iter().chain(b).collect();
    gossip(&mut everyone, 10);
    assert_converged(&everyone);

    let values: BTreeSet<_> = everyone[0].values().copied().collect();
    assert_eq!(values, BTreeSet::from(["budget", "hiring", "roadmap"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// 5. STATE-BASED AND OPERATION-BASED AGREEMENT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn counter_replay_in_any_order_matches_state_merge() {
    let ops: Vec<CounterDelta> = (0..10u8)
        .map(|i| {
            let op = CounterOperation::new(u64::from(i) + 1, node(i % 3));
            if i % 2 == 0 {
                CounterDelta::Increment(op)
            } else {
                CounterDelta::Decrement(op)
            }
        })
        .collect();

    let forward = ops
        .iter()
        .try_fold(PNCounter::new(), |c, op| c.apply(op))
        .unwrap();
    let backward = ops
        .iter()
        .rev()
        .try_fold(PNCounter::new(), |c, op| c.apply(op))
        .unwrap();
    assert_eq!(forward, backward);
    assert_eq!(forward.sum(), -5);
}

#[test]
fn our_set_causal_delivery_matches_merge() {
    let add = SetDelta::Add(StampedSetOperation::new("a", tag(1), Timestamp::new(1)));
    let update = SetDelta::Update(StampedSetOperation::new("b", tag(1), Timestamp::new(2)));
    let remove = SetDelta::Remove(StampedSetOperation::new("b", tag(1), Timestamp::new(3)));

    let origin: OURSet<&str> = OURSet::new();
    let left = origin.apply(&add).unwrap().apply(&update).unwrap();
    let right = origin.apply(&add).unwrap().apply(&remove).unwrap();

    let via_ops = left.apply(&remove).unwrap();
    assert_eq!(via_ops.values(), left.merge(&right).values());
    assert!(via_ops.is_empty());
}

#[test]
fn patch_registers_across_three_nodes() {
    let doc = ElementId::from_uuid(uuid::Uuid::from_bytes([9; 16]));
    let nodes = [node(1), node(2), node(3)];
    let start = VectorClock::for_nodes(nodes);

    let created = PatchRegisterMap::<VectorClock>::new()
        .apply(&RegisterOperation::new(
            doc,
            json!({"title": "draft", "body": ""}),
            start.increment(nodes[0]),
        ))
        .unwrap();

    // Node 2 edits after seeing the create; node 3 edits concurrently with node 2.
    let edited = created
        .assign(
            doc,
            &json!({"body": "text"}),
            start.increment(nodes[0]).increment(nodes[1]),
        )
        .unwrap();
    let concurrent = created
        .assign(
            doc,
            &json!({"title": "renamed"}),
            start.increment(nodes[0]).increment(nodes[2]),
        )
        .unwrap();

    let replicas = [created, edited, concurrent];
    let merged = merge_all(PatchRegisterMap::new(), &replicas);
    let reversed = merge_all(PatchRegisterMap::new(), replicas.iter().rev());
    assert_eq!(merged, reversed);
    assert!(merged.value(&doc).is_some());
}
