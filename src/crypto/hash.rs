//! Hashing utilities for the ledger
//!
//! SHA-256 digests, the canonical JSON hashing used for blocks and
//! transactions, and the hex-prefix difficulty check used by proof of work.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest
pub type Hash = [u8; 32];

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Deterministic JSON encoding of a value.
///
/// Only used with derived structs whose fields are strings, numbers and
/// sequences, for which serde_json serialization cannot fail. Field order
/// is the struct declaration order.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// SHA-256 over the canonical encoding of a value
pub fn canonical_hash<T: Serialize>(value: &T) -> Hash {
    sha256(&canonical_bytes(value))
}

/// Checks if a hash meets the difficulty target.
///
/// The lowercase hex rendering of the hash must begin with `difficulty`
/// `'0'` characters, i.e. the first `difficulty` nibbles must be zero.
pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    if difficulty > hash.len() * 2 {
        return false;
    }

    (0..difficulty).all(|i| {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        nibble == 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_double_sha256() {
        let data = b"hello world";
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
        assert_ne!(double_sha256(data), sha256(data));
    }

    #[test]
    fn test_meets_difficulty() {
        let mut hash = [0xFFu8; 32];
        hash[0] = 0x00;
        hash[1] = 0x0F;

        // "000fff..." has three leading hex zeros
        assert!(meets_difficulty(&hash, 0));
        assert!(meets_difficulty(&hash, 2));
        assert!(meets_difficulty(&hash, 3));
        assert!(!meets_difficulty(&hash, 4));
    }

    #[test]
    fn test_meets_difficulty_matches_hex_prefix() {
        let hash = sha256(b"difficulty");
        let rendered = hex::encode(hash);
        for difficulty in 0..6 {
            assert_eq!(
                meets_difficulty(&hash, difficulty),
                rendered.starts_with(&"0".repeat(difficulty))
            );
        }
    }

    #[test]
    fn test_difficulty_beyond_digest_length() {
        assert!(meets_difficulty(&[0u8; 32], 64));
        assert!(!meets_difficulty(&[0u8; 32], 65));
    }

    #[test]
    fn test_canonical_bytes_keep_field_order() {
        #[derive(Serialize)]
        struct Pair {
            zeta: u8,
            alpha: u8,
        }

        let bytes = canonical_bytes(&Pair { zeta: 1, alpha: 2 });
        assert_eq!(bytes, br#"{"zeta":1,"alpha":2}"#.to_vec());
    }
}
