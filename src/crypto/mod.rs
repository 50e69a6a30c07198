//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and canonical JSON hashing
//! - ECDSA key management (secp256k1)
//! - Address derivation

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{derive_address, derive_address_from_coordinates, is_valid_address};
pub use hash::{
    canonical_bytes, canonical_hash, double_sha256, meets_difficulty, sha256, sha256_hex, Hash,
};
pub use keys::{
    public_key_from_hex, public_key_to_hex, sign_digest, verify_digest, KeyError, KeyPair,
    Signature,
};
