//! Shard allocation strategies for the weighted hash ring.
//!
//! This crate assigns a fixed, numbered set of shards (0..N-1) to the nodes
//! registered on a [`ringcore::HashRing`], approximating weight-proportional
//! balance while keeping assignments close to their nearest ring position
//! for stability under membership change.

pub mod strategy;

pub use strategy::{AllocationStrategy, WeightedStrategy};
