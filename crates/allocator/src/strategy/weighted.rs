//! Weighted two-pass allocation strategy.
//!
//! # Algorithm
//!
//! 1. Resolve every shard to its nearest ring entry and record the distance.
//! 2. Sort placements ascending by distance, so the closest matches claim
//!    their node first (ties keep shard-id order; the sort is stable).
//! 3. First pass: walk the sorted placements. A shard whose node is already
//!    at capacity is deferred; otherwise it is assigned and the node's
//!    allocation count is checked against its quota
//!    `max(1, floor(count * weight / total_weight))`. The quota is
//!    re-evaluated after every assignment rather than precomputed.
//! 4. Second pass: deferred shards re-resolve their nearest node while
//!    skipping nodes at capacity. Once every node is at capacity, the
//!    remaining shards fall back to the plain nearest entry; at that point
//!    balance is no longer achievable and a complete assignment matters
//!    more than distribution.
//!
//! Each node's final share stays near its weight-proportional quota, while
//! most shards keep their nearest-neighbor placement, which limits churn
//! when membership changes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use ringcore::{nearest, nearest_excluding, HashRing, Partitioner, StableKey, MIN_WEIGHT};

use crate::strategy::AllocationStrategy;

/// Weight-aware greedy shard allocator.
#[derive(Debug, Clone, Default)]
pub struct WeightedStrategy;

impl WeightedStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Record one assignment to `key` and mark the node at capacity once its
/// count reaches its current quota.
fn note_assignment(
    key: &Arc<str>,
    shard_count: usize,
    total_weight: f64,
    weights: &HashMap<Arc<str>, f64>,
    allocated: &mut HashMap<Arc<str>, usize>,
    at_capacity: &mut HashSet<Arc<str>>,
) {
    let count = allocated.entry(key.clone()).or_insert(0);
    *count += 1;
    let weight = weights.get(key).copied().unwrap_or(MIN_WEIGHT);
    let quota = ((shard_count as f64 * weight / total_weight).floor() as usize).max(1);
    if *count >= quota {
        at_capacity.insert(key.clone());
    }
}

impl<A, P> AllocationStrategy<A, P> for WeightedStrategy
where
    A: StableKey + Clone,
    P: Partitioner,
{
    fn assign(&self, ring: &HashRing<A, P>, count: usize) -> Option<Vec<A>> {
        let entries = ring.tokens();
        if entries.is_empty() {
            return None;
        }
        let total_weight = ring.total_weight();
        let members = ring.members();
        let node_total = members.len();
        let mut weights: HashMap<Arc<str>, f64> = HashMap::with_capacity(node_total);
        let mut values: HashMap<Arc<str>, A> = HashMap::with_capacity(node_total);
        for member in members {
            weights.insert(member.key.clone(), member.weight);
            values.insert(member.key, member.value);
        }

        let mut placements: Vec<(usize, Arc<str>, u64)> = Vec::with_capacity(count);
        for shard in 0..count {
            let target = ring.shard_token(shard);
            let idx = nearest(&entries, target)?;
            let owner = entries[idx].key.clone();
            let distance = entries[idx].token.distance_to(target);
            placements.push((shard, owner, distance));
        }
        placements.sort_by_key(|&(_, _, distance)| distance);

        let mut shards: Vec<Option<A>> = vec![None; count];
        let mut allocated: HashMap<Arc<str>, usize> = HashMap::new();
        let mut at_capacity: HashSet<Arc<str>> = HashSet::new();
        let mut deferred: Vec<usize> = Vec::new();

        for (shard, owner, _) in &placements {
            if at_capacity.contains(owner) {
                deferred.push(*shard);
                continue;
            }
            shards[*shard] = values.get(owner).cloned();
            note_assignment(
                owner,
                count,
                total_weight,
                &weights,
                &mut allocated,
                &mut at_capacity,
            );
        }
        debug!(count, deferred = deferred.len(), "first allocation pass complete");

        let mut all_full = at_capacity.len() >= node_total;
        for shard in deferred {
            let target = ring.shard_token(shard);
            let idx = if all_full {
                nearest(&entries, target)?
            } else {
                match nearest_excluding(&entries, target, &at_capacity) {
                    Some(idx) => idx,
                    None => nearest(&entries, target)?,
                }
            };
            let owner = entries[idx].key.clone();
            shards[shard] = values.get(&owner).cloned();
            if !all_full {
                note_assignment(
                    &owner,
                    count,
                    total_weight,
                    &weights,
                    &mut allocated,
                    &mut at_capacity,
                );
                if at_capacity.len() >= node_total {
                    all_full = true;
                }
            }
        }

        shards.into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "WeightedStrategy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(shards: &[&str]) -> HashMap<String, usize> {
        let mut out = HashMap::new();
        for key in shards {
            *out.entry(key.to_string()).or_insert(0) += 1;
        }
        out
    }

    #[test]
    fn test_quota_floor_is_at_least_one() {
        // A node whose weight share floors to zero still gets a quota of 1.
        let mut weights: HashMap<Arc<str>, f64> = HashMap::new();
        weights.insert(Arc::from("tiny"), 0.1);
        let mut allocated = HashMap::new();
        let mut at_capacity = HashSet::new();
        note_assignment(
            &Arc::from("tiny"),
            10,
            100.0,
            &weights,
            &mut allocated,
            &mut at_capacity,
        );
        assert!(at_capacity.contains("tiny"));
    }

    #[test]
    fn test_overcommitted_cluster_still_covers_every_shard() {
        // Three equal nodes, quotas floor(10/3) = 3 each: 9 slots of quota
        // for 10 shards. The 10th lands via the plain-nearest fallback.
        let ring: HashRing<&str> = HashRing::new(64);
        ring.add_many(["n1", "n2", "n3"], 1.0).unwrap();
        let shards = WeightedStrategy::new().assign(&ring, 10).unwrap();
        assert_eq!(shards.len(), 10);
        let mut per_node: Vec<usize> = counts(&shards).into_values().collect();
        per_node.sort_unstable();
        assert_eq!(per_node, vec![3, 3, 4]);
    }
}
