//! Allocation strategy abstractions.
//!
//! A strategy decides which node owns each numbered shard. Strategies are
//! layered over the core ring rather than built into it, so alternative
//! placement policies can share the same membership state.

pub mod weighted;

pub use weighted::WeightedStrategy;

use ringcore::{HashRing, Murmur3Partitioner, Partitioner, StableKey};

/// Trait for shard allocation strategies.
///
/// Implementations must be thread-safe (Send + Sync) as they may be shared
/// across threads.
pub trait AllocationStrategy<A, P = Murmur3Partitioner>: Send + Sync
where
    A: StableKey + Clone,
    P: Partitioner,
{
    /// Assign shard ids `0..count` to nodes.
    ///
    /// Returns a vector of length `count` whose element at index `i` is the
    /// node owning shard `i`, or `None` when the ring has no registered
    /// nodes. `count == 0` on a non-empty ring yields an empty vector.
    fn assign(&self, ring: &HashRing<A, P>, count: usize) -> Option<Vec<A>>;

    /// Get the strategy name (for logging/debugging).
    fn name(&self) -> &'static str;
}
