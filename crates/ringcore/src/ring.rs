//! Weighted consistent hash ring.
//!
//! The ring owns two pieces of state: a registry of physical nodes (value,
//! weight, insertion order) and a sorted array of virtual node entries. Node
//! set mutations rebuild only the affected virtual entries and re-sort;
//! lookups binary-search the sorted array. There is no background work and
//! no caching of lookup results.
//!
//! Mutations go through a `parking_lot::RwLock`, so a single membership
//! coordinator can mutate through `&self` while other threads read
//! concurrently. All operations are synchronous and CPU-bound.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::StableKey;
use crate::partitioner::{Murmur3Partitioner, Partitioner};
use crate::token::Murmur3Token;
use crate::vnode::VirtualNode;

/// Default virtual entries per unit of weight.
pub const DEFAULT_BASE_WEIGHT: usize = 128;

/// Smallest effective node weight; lower values are clamped up to this.
pub const MIN_WEIGHT: f64 = 0.1;

struct Slot<A> {
    value: A,
    weight: f64,
}

struct RingState<A> {
    /// Virtual entries sorted ascending by token (stable sort, so equal
    /// tokens keep insertion order).
    entries: Vec<VirtualNode>,
    registry: HashMap<Arc<str>, Slot<A>>,
    /// Registry keys in insertion order; iteration yields this order, not
    /// ring order.
    order: Vec<Arc<str>>,
    /// Running sum of all registered weights.
    total_weight: f64,
}

/// A registered node as seen from outside the ring.
#[derive(Debug, Clone)]
pub struct RingMember<A> {
    pub key: Arc<str>,
    pub value: A,
    pub weight: f64,
}

/// Debug/introspection snapshot of ring state.
///
/// For logging and debugging only; not a wire format and carries no
/// compatibility guarantee.
#[derive(Debug, Clone, Serialize)]
pub struct RingSnapshot {
    pub base_weight: usize,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub key: String,
    pub weight: f64,
    pub vnodes: usize,
}

/// Weighted consistent hash ring mapping string keys to registered nodes.
///
/// `A` is the caller's node type; the ring only ever looks at the string
/// produced by its [`StableKey`] impl. `base_weight` fixes the virtual entry
/// density per unit of weight and is immutable after construction.
pub struct HashRing<A, P = Murmur3Partitioner>
where
    A: StableKey + Clone,
    P: Partitioner,
{
    base_weight: usize,
    partitioner: P,
    state: RwLock<RingState<A>>,
    /// Memoized shard tokens, scoped to this ring instance so independent
    /// rings with different partitioners never share hashes.
    shard_tokens: DashMap<usize, Murmur3Token>,
}

impl<A> HashRing<A>
where
    A: StableKey + Clone,
{
    /// Create an empty ring with the given base weight (clamped to min 1).
    pub fn new(base_weight: usize) -> Self {
        Self::with_partitioner(base_weight, Murmur3Partitioner)
    }
}

impl<A> Default for HashRing<A>
where
    A: StableKey + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_BASE_WEIGHT)
    }
}

impl<A, P> HashRing<A, P>
where
    A: StableKey + Clone,
    P: Partitioner,
{
    /// Create an empty ring with an explicit partitioner.
    pub fn with_partitioner(base_weight: usize, partitioner: P) -> Self {
        Self {
            base_weight: base_weight.max(1),
            partitioner,
            state: RwLock::new(RingState {
                entries: Vec::new(),
                registry: HashMap::new(),
                order: Vec::new(),
                total_weight: 0.0,
            }),
            shard_tokens: DashMap::new(),
        }
    }

    pub fn base_weight(&self) -> usize {
        self.base_weight
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Number of registered physical nodes.
    pub fn node_count(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Number of virtual entries on the ring.
    pub fn token_count(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().registry.is_empty()
    }

    /// Sum of all registered weights.
    pub fn total_weight(&self) -> f64 {
        self.state.read().total_weight
    }

    /// Add a single node. Equivalent to `add_many` with one element.
    pub fn add(&self, node: A, weight: f64) -> Result<()> {
        self.add_many(std::iter::once(node), weight)
    }

    /// Add (or re-weight) a batch of nodes, all at the given weight.
    ///
    /// Re-adding a node with its current weight is a pure no-op. Re-adding
    /// with a different weight regenerates only that node's virtual entries.
    /// The ring is re-sorted once per batch, so callers adding many nodes
    /// should prefer this over repeated `add` calls.
    pub fn add_many<I>(&self, nodes: I, weight: f64) -> Result<()>
    where
        I: IntoIterator<Item = A>,
    {
        if !weight.is_finite() {
            return Err(Error::InvalidWeight(weight));
        }
        let weight = weight.max(MIN_WEIGHT);

        let mut guard = self.state.write();
        let state = &mut *guard;

        let mut touched: Vec<Arc<str>> = Vec::new();
        let mut reweighted: HashSet<Arc<str>> = HashSet::new();
        for node in nodes {
            let key: Arc<str> = node.stable_key().into();
            match state.registry.entry(key.clone()) {
                Entry::Occupied(mut slot) => {
                    let old = slot.get().weight;
                    if old == weight {
                        continue;
                    }
                    state.total_weight += weight - old;
                    slot.get_mut().weight = weight;
                    reweighted.insert(key.clone());
                    touched.push(key);
                }
                Entry::Vacant(slot) => {
                    slot.insert(Slot {
                        value: node,
                        weight,
                    });
                    state.order.push(key.clone());
                    state.total_weight += weight;
                    touched.push(key);
                }
            }
        }

        if touched.is_empty() {
            return Ok(());
        }

        if !reweighted.is_empty() {
            state.entries.retain(|vnode| !reweighted.contains(&vnode.key));
        }

        let per_node = (weight * self.base_weight as f64).round() as usize;
        for key in &touched {
            for i in (1..=per_node).rev() {
                let token = self.partitioner.partition(format!("{key}:{i}").as_bytes());
                state.entries.push(VirtualNode::new(token, key.clone()));
            }
        }
        state.entries.sort_by_key(|vnode| vnode.token);

        debug!(
            nodes = touched.len(),
            weight,
            tokens = state.entries.len(),
            "ring membership updated"
        );
        Ok(())
    }

    /// Remove a node. Returns false (and leaves the ring untouched) if the
    /// node was not registered.
    pub fn remove(&self, node: &A) -> bool {
        let key = node.stable_key();
        let mut guard = self.state.write();
        let state = &mut *guard;
        let Some(slot) = state.registry.remove(key.as_str()) else {
            return false;
        };
        state.order.retain(|k| k.as_ref() != key);
        state.entries.retain(|vnode| vnode.key.as_ref() != key);
        state.total_weight -= slot.weight;
        debug!(key = %key, weight = slot.weight, "removed node from ring");
        true
    }

    /// Registry membership check by key.
    pub fn has(&self, node: &A) -> bool {
        self.state
            .read()
            .registry
            .contains_key(node.stable_key().as_str())
    }

    /// Registered node values in insertion order (not ring order).
    pub fn nodes(&self) -> Vec<A> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|key| state.registry.get(key).map(|slot| slot.value.clone()))
            .collect()
    }

    /// Registered nodes with their keys and weights, in insertion order.
    pub fn members(&self) -> Vec<RingMember<A>> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|key| {
                state.registry.get(key).map(|slot| RingMember {
                    key: key.clone(),
                    value: slot.value.clone(),
                    weight: slot.weight,
                })
            })
            .collect()
    }

    /// Snapshot of the sorted virtual entries.
    pub fn tokens(&self) -> Vec<VirtualNode> {
        self.state.read().entries.clone()
    }

    /// Resolve a key to its owning node. Returns `None` iff the ring is
    /// empty.
    pub fn lookup(&self, key: &str) -> Option<A> {
        let target = self.partitioner.partition(key.as_bytes());
        let state = self.state.read();
        let idx = nearest(&state.entries, target)?;
        let owner = &state.entries[idx].key;
        state.registry.get(owner).map(|slot| slot.value.clone())
    }

    /// Token for shard id `shard`, memoized per ring instance.
    pub fn shard_token(&self, shard: usize) -> Murmur3Token {
        if let Some(token) = self.shard_tokens.get(&shard) {
            return *token;
        }
        let token = self
            .partitioner
            .partition(format!("shard-{shard}").as_bytes());
        self.shard_tokens.insert(shard, token);
        token
    }

    /// Debug snapshot of the ring configuration and membership.
    pub fn snapshot(&self) -> RingSnapshot {
        let state = self.state.read();
        let mut vnode_counts: HashMap<&str, usize> = HashMap::new();
        for vnode in &state.entries {
            *vnode_counts.entry(vnode.key.as_ref()).or_insert(0) += 1;
        }
        RingSnapshot {
            base_weight: self.base_weight,
            nodes: state
                .order
                .iter()
                .map(|key| NodeSnapshot {
                    key: key.to_string(),
                    weight: state
                        .registry
                        .get(key)
                        .map(|slot| slot.weight)
                        .unwrap_or_default(),
                    vnodes: vnode_counts.get(key.as_ref()).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}

/// Index of the entry owning `target`, or `None` on an empty ring.
///
/// Lower-bound binary search for the first token `>= target`; the candidate
/// wraps to the last entry when `target` exceeds every token. The candidate
/// is then compared against its immediate left neighbor by absolute distance
/// and the closer of the two wins (ties go to the right candidate). This is
/// a local two-candidate tie-break, not a circular nearest-neighbor search.
pub fn nearest(entries: &[VirtualNode], target: Murmur3Token) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    let lo = entries.partition_point(|vnode| vnode.token < target);
    let a = if lo == entries.len() { lo - 1 } else { lo };
    let b = match lo.checked_sub(1) {
        Some(b) => b,
        None => return Some(a),
    };
    if entries[b].token.distance_to(target) < entries[a].token.distance_to(target) {
        Some(b)
    } else {
        Some(a)
    }
}

/// Like [`nearest`], but skips entries owned by excluded nodes.
///
/// Walks outward from the insertion point, consuming whichever of the left
/// and right frontier entries is closer to `target`, until an entry owned by
/// an unexcluded node is found. Bounded by the ring length; returns `None`
/// when every entry is excluded (or the ring is empty).
pub fn nearest_excluding(
    entries: &[VirtualNode],
    target: Murmur3Token,
    excluded: &HashSet<Arc<str>>,
) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    let lo = entries.partition_point(|vnode| vnode.token < target);
    let mut left = lo.checked_sub(1);
    let mut right = if lo < entries.len() { Some(lo) } else { None };

    loop {
        let idx = match (left, right) {
            (None, None) => return None,
            (Some(l), None) => {
                left = l.checked_sub(1);
                l
            }
            (None, Some(r)) => {
                right = if r + 1 < entries.len() { Some(r + 1) } else { None };
                r
            }
            (Some(l), Some(r)) => {
                if entries[l].token.distance_to(target) < entries[r].token.distance_to(target) {
                    left = l.checked_sub(1);
                    l
                } else {
                    right = if r + 1 < entries.len() { Some(r + 1) } else { None };
                    r
                }
            }
        };
        if !excluded.contains(&entries[idx].key) {
            return Some(idx);
        }
    }
}
