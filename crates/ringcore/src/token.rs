//! Murmur3 hash primitive and ring token type.
//!
//! Every process participating in the same cluster must derive identical
//! tokens from identical byte inputs, otherwise independently computed
//! shard placements diverge. That cross-process contract is why the hash
//! is implemented here rather than delegated to a hasher whose algorithm
//! could change between library versions.

use std::fmt;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

#[inline]
fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// MurmurHash3, 128-bit x64 variant.
///
/// Matches the canonical reference implementation: little-endian 16-byte
/// blocks, wrapping 64-bit arithmetic throughout, and the standard tail and
/// finalization mixing. Returns both output lanes `(h1, h2)`.
pub fn murmur3_x64_128(data: &[u8], seed: u32) -> (u64, u64) {
    let mut h1 = seed as u64;
    let mut h2 = seed as u64;

    let nblocks = data.len() / 16;
    for block in data.chunks_exact(16) {
        let mut k1 = read_u64_le(&block[..8]);
        let mut k2 = read_u64_le(&block[8..]);

        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(27).wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
        h2 = h2.rotate_left(31).wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;
    for (i, &byte) in tail.iter().enumerate().take(8) {
        k1 |= (byte as u64) << (8 * i);
    }
    for (i, &byte) in tail.iter().enumerate().skip(8) {
        k2 |= (byte as u64) << (8 * (i - 8));
    }
    if tail.len() > 8 {
        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
    }
    if !tail.is_empty() {
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

/// Murmur3 ring token using u64 representation.
///
/// The token is the low lane (`h1`) of the 128-bit hash with seed 0.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Murmur3Token(pub u64);

impl Murmur3Token {
    /// Creates a token from a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let (h1, _h2) = murmur3_x64_128(data, 0);
        Murmur3Token(h1)
    }

    /// Creates a token from a string key (hashed over its UTF-8 bytes).
    pub fn from_key(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }

    /// Absolute distance to another token.
    ///
    /// Plain integer difference, not wraparound distance on the ring. Lookup
    /// treats the ring as circular only for the past-the-end wrap case.
    #[inline]
    pub fn distance_to(&self, other: Murmur3Token) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Murmur3Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        // Canonical MurmurHash3 x64_128 values, seed 0.
        assert_eq!(murmur3_x64_128(b"", 0), (0, 0));
        assert_eq!(
            murmur3_x64_128(b"hello", 0),
            (0xcbd8_a7b3_41bd_9b02, 0x5b1e_906a_48ae_1d19)
        );
        assert_eq!(
            murmur3_x64_128(b"The quick brown fox jumps over the lazy dog", 0),
            (0xe34b_bc7b_bc07_1b6c, 0x7a43_3ca9_c49a_9347)
        );
    }

    #[test]
    fn test_token_is_low_lane() {
        assert_eq!(Murmur3Token::from_key("hello").0, 0xcbd8_a7b3_41bd_9b02);
        // Cross-checked against an independent implementation of the
        // reference algorithm.
        assert_eq!(Murmur3Token::from_key("shard-0").0, 0x6d2e_4ac5_84c6_d167);
        assert_eq!(Murmur3Token::from_key("shard-1").0, 0xa403_2653_5ca9_3b82);
        assert_eq!(Murmur3Token::from_key("node-a:1").0, 0x85d9_eed0_6156_7b44);
        assert_eq!(Murmur3Token::from_key("node-a:2").0, 0x57bc_9f44_62f7_1279);
    }

    #[test]
    fn test_block_and_tail_lengths() {
        // Exercise the block loop and every tail branch around the 8 and 16
        // byte boundaries.
        let data: Vec<u8> = (0u8..64).collect();
        let mut seen = std::collections::HashSet::new();
        for len in 0..=33 {
            let (h1, h2) = murmur3_x64_128(&data[..len], 0);
            assert_eq!(murmur3_x64_128(&data[..len], 0), (h1, h2));
            seen.insert((h1, h2));
        }
        // No accidental collisions across lengths on this input.
        assert_eq!(seen.len(), 34);
    }

    #[test]
    fn test_seed_changes_output() {
        assert_ne!(murmur3_x64_128(b"hello", 0), murmur3_x64_128(b"hello", 1));
    }

    #[test]
    fn test_distance_is_plain_difference() {
        let a = Murmur3Token(100);
        let b = Murmur3Token(u64::MAX);
        assert_eq!(a.distance_to(b), u64::MAX - 100);
        assert_eq!(b.distance_to(a), u64::MAX - 100);
        assert_eq!(a.distance_to(a), 0);
    }
}
