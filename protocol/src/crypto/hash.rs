//! # Hashing Utilities
//!
//! SHA-256 is the only hash in CODI. Codes and protocol-meta ids are both
//! derived from `SHA-256("<prefix>:<identity>:<slot>")`, and any other
//! implementation of the protocol has to reproduce those digests byte for
//! byte, so there is no room for a second, faster hash here.
//!
//! The helpers below are thin wrappers around `sha2`. They exist so the
//! derivation code reads in terms of what it needs (a digest, a hex string,
//! a leading integer) rather than hasher plumbing.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
///
/// # Example
///
/// ```
/// use codi_protocol::crypto::sha256;
///
/// let digest = sha256(b"codi");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash several byte slices as if they had been concatenated.
///
/// Lets callers hash `prefix ":" identity ":" slot` without building the
/// intermediate string first.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 of `data` as 64 lowercase hex characters.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Interpret the first 8 bytes of a digest as a big-endian `u64`.
///
/// Equivalent to parsing the first 16 hex characters of the digest as an
/// unsigned integer, minus the floating-point rounding some languages
/// sneak into that step.
pub fn leading_u64(digest: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Compare two byte strings without bailing out at the first mismatch.
///
/// Length is not secret (codes and hashes have fixed, public lengths), so
/// a length mismatch returns early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_abc_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_multi_matches_concatenation() {
        let multi = sha256_multi(&[b"DEFAULT", b":", b"alice", b":", b"42"]);
        assert_eq!(multi, sha256(b"DEFAULT:alice:42"));
    }

    #[test]
    fn test_leading_u64_is_big_endian() {
        let mut digest = [0u8; 32];
        digest[..8].copy_from_slice(&[0, 0, 0, 0, 0, 0, 1, 2]);
        digest[8] = 0xFF; // ignored
        assert_eq!(leading_u64(&digest), 0x0102);
    }

    #[test]
    fn test_leading_u64_matches_hex_prefix() {
        let digest = sha256(b"abc");
        let from_hex = u64::from_str_radix(&hex::encode(digest)[..16], 16).unwrap();
        assert_eq!(leading_u64(&digest), from_hex);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"12345678", b"12345678"));
        assert!(!constant_time_eq(b"12345678", b"12345679"));
        assert!(!constant_time_eq(b"1234567", b"12345678"));
        assert!(constant_time_eq(b"", b""));
    }
}
