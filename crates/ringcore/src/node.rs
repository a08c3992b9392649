//! Node identity extraction.
//!
//! The ring never inspects a node beyond the stable string produced here:
//! the key names the node's virtual entries and its registry slot, so it
//! must be unique per logical node and stable across processes.

use std::fmt;

/// Produces the unique, stable string key for a logical node.
///
/// Supplied by the caller owning node identity (typically derived from an
/// address or id). Two nodes with the same key are the same node as far as
/// the ring is concerned.
pub trait StableKey {
    fn stable_key(&self) -> String;
}

impl StableKey for String {
    fn stable_key(&self) -> String {
        self.clone()
    }
}

impl StableKey for &str {
    fn stable_key(&self) -> String {
        (*self).to_string()
    }
}

/// Logical node participating in the ring.
///
/// Keep this struct small and cheap to clone; heavy mutable state
/// (connections, metrics, etc.) should live elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Unique, stable name; doubles as the ring key.
    pub name: String,
    /// Optional endpoint address for the surrounding coordinator.
    pub address: Option<String>,
}

impl Node {
    /// Construct a new node with basic metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    pub fn with_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
        }
    }
}

impl StableKey for Node {
    fn stable_key(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(addr) => write!(f, "{}@{}", self.name, addr),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_key_impls() {
        assert_eq!("n1".stable_key(), "n1");
        assert_eq!(String::from("n1").stable_key(), "n1");
        assert_eq!(Node::new("n1").stable_key(), "n1");
        assert_eq!(Node::with_address("n1", "10.0.0.1:7000").stable_key(), "n1");
    }
}
