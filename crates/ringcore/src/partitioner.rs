//! Partitioner seam: key bytes to ring tokens.
//!
//! Deployments where several independent processes must agree on placement
//! need the exact Murmur3 algorithm on every participant. A deployment that
//! runs a single authoritative ring may substitute any sufficiently uniform
//! 64-bit hash by implementing this trait; the substitution is a cluster-wide
//! configuration decision, not something the ring can detect.

use crate::token::Murmur3Token;

/// Converts keys into tokens for placement on the hash ring.
///
/// Partitioners are stateless and thread-safe, allowing concurrent token
/// generation without synchronization overhead.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a ring token.
    fn partition(&self, key: &[u8]) -> Murmur3Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

/// The default partitioner: 128-bit x64 Murmur3, seed 0, low lane kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Partitioner;

impl Partitioner for Murmur3Partitioner {
    fn partition(&self, key: &[u8]) -> Murmur3Token {
        Murmur3Token::from_bytes(key)
    }

    fn name(&self) -> &'static str {
        "Murmur3Partitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_matches_token_constructor() {
        let p = Murmur3Partitioner;
        assert_eq!(p.partition(b"hello"), Murmur3Token::from_key("hello"));
        assert_eq!(p.name(), "Murmur3Partitioner");
    }
}
