//! Core library for the weighted consistent hash ring.
//!
//! This crate provides the fundamental abstractions for weighted consistent
//! hashing:
//! - The Murmur3 hash primitive and token type
//! - The partitioner seam (key bytes -> ring token)
//! - Node identity extraction
//! - Virtual node entries
//! - Ring maintenance and point lookup

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod vnode;

pub use error::{Error, Result};
pub use node::{Node, StableKey};
pub use partitioner::{Murmur3Partitioner, Partitioner};
pub use ring::{
    nearest, nearest_excluding, HashRing, NodeSnapshot, RingMember, RingSnapshot,
    DEFAULT_BASE_WEIGHT, MIN_WEIGHT,
};
pub use token::{murmur3_x64_128, Murmur3Token};
pub use vnode::VirtualNode;
