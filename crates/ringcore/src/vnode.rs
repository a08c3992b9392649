//! Virtual node entries.
//!
//! Each physical node contributes `round(weight * base_weight)` entries to
//! the ring, which smooths load distribution and lets a node's share of the
//! key space scale with its weight. The entries are cheap: a token plus a
//! shared pointer to the owning node's key.

use std::fmt;
use std::sync::Arc;

use crate::token::Murmur3Token;

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node. The token is
/// the hash of `"{key}:{index}"`, so every process derives the same positions
/// for the same membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Murmur3Token,
    /// Key of the physical node that owns this entry.
    pub key: Arc<str>,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Murmur3Token, key: Arc<str>) -> Self {
        Self { token, key }
    }

    #[inline]
    pub fn token(&self) -> Murmur3Token {
        self.token
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(token={}, key={})", self.token, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnode_creation() {
        let vnode = VirtualNode::new(Murmur3Token(100), Arc::from("node1"));
        assert_eq!(vnode.token(), Murmur3Token(100));
        assert_eq!(vnode.key(), "node1");
    }

    #[test]
    fn test_vnode_token_is_derived_from_key_and_index() {
        let a1 = VirtualNode::new(Murmur3Token::from_key("a:1"), Arc::from("a"));
        let a2 = VirtualNode::new(Murmur3Token::from_key("a:2"), Arc::from("a"));
        assert_ne!(a1.token(), a2.token());
        assert_eq!(a1.key(), a2.key());
    }
}
