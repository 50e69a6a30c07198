//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. Keys and signatures travel between nodes as
//! fixed-width hex: a public key is `X ‖ Y` (128 hex chars) and a signature is
//! `R ‖ S` (128 hex chars).

use rand::rngs::OsRng;
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::address::derive_address;
use super::hash::Hash;

/// Length in bytes of one curve coordinate or one signature scalar
pub const SCALAR_SIZE: usize = 32;

/// Tag byte of an uncompressed SEC1 point
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// An ECDSA signature as its two scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: [u8; SCALAR_SIZE],
    s: [u8; SCALAR_SIZE],
}

impl Signature {
    /// `R ‖ S` as 64 bytes
    pub fn to_bytes(&self) -> [u8; 2 * SCALAR_SIZE] {
        let mut bytes = [0u8; 2 * SCALAR_SIZE];
        bytes[..SCALAR_SIZE].copy_from_slice(&self.r);
        bytes[SCALAR_SIZE..].copy_from_slice(&self.s);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 2 * SCALAR_SIZE {
            return Err(KeyError::InvalidSignature);
        }
        let mut r = [0u8; SCALAR_SIZE];
        let mut s = [0u8; SCALAR_SIZE];
        r.copy_from_slice(&bytes[..SCALAR_SIZE]);
        s.copy_from_slice(&bytes[SCALAR_SIZE..]);
        Ok(Self { r, s })
    }

    fn to_ecdsa(self) -> Result<ecdsa::Signature, KeyError> {
        ecdsa::Signature::from_compact(&self.to_bytes()).map_err(|_| KeyError::InvalidSignature)
    }
}

impl From<ecdsa::Signature> for Signature {
    fn from(signature: ecdsa::Signature) -> Self {
        let compact = signature.serialize_compact();
        let mut r = [0u8; SCALAR_SIZE];
        let mut s = [0u8; SCALAR_SIZE];
        r.copy_from_slice(&compact[..SCALAR_SIZE]);
        s.copy_from_slice(&compact[SCALAR_SIZE..]);
        Self { r, s }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.r), hex::encode(self.s))
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_bytes(&bytes)
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    ///
    /// Panics if the operating system entropy source is unavailable; a wallet
    /// cannot operate without one.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as `X ‖ Y` hex
    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.public_key)
    }

    /// Account identifier derived from the public key
    pub fn address(&self) -> String {
        derive_address(&self.public_key)
    }

    /// Sign a 32-byte digest with the private key
    pub fn sign(&self, digest: &Hash) -> Signature {
        sign_digest(&self.secret_key, digest)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, digest: &Hash, signature: &Signature) -> bool {
        verify_digest(&self.public_key, digest, signature)
    }
}

/// The affine coordinates `(X, Y)` of a public key, 32 big-endian bytes each
pub fn public_key_coordinates(public_key: &PublicKey) -> ([u8; SCALAR_SIZE], [u8; SCALAR_SIZE]) {
    let serialized = public_key.serialize_uncompressed();
    let mut x = [0u8; SCALAR_SIZE];
    let mut y = [0u8; SCALAR_SIZE];
    x.copy_from_slice(&serialized[1..1 + SCALAR_SIZE]);
    y.copy_from_slice(&serialized[1 + SCALAR_SIZE..]);
    (x, y)
}

/// Render a public key as `X ‖ Y` hex (128 chars)
pub fn public_key_to_hex(public_key: &PublicKey) -> String {
    let (x, y) = public_key_coordinates(public_key);
    format!("{}{}", hex::encode(x), hex::encode(y))
}

/// Parse a public key from `X ‖ Y` hex
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    if bytes.len() != 2 * SCALAR_SIZE {
        return Err(KeyError::InvalidPublicKey);
    }

    let mut encoded = Vec::with_capacity(1 + bytes.len());
    encoded.push(UNCOMPRESSED_TAG);
    encoded.extend_from_slice(&bytes);
    PublicKey::from_slice(&encoded).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a digest with a secret key
pub fn sign_digest(secret_key: &SecretKey, digest: &Hash) -> Signature {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);
    secp.sign_ecdsa(&message, secret_key).into()
}

/// Verify a signature over a digest.
///
/// Malformed scalars (zero or out of the curve order) verify as false.
pub fn verify_digest(public_key: &PublicKey, digest: &Hash, signature: &Signature) -> bool {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);

    match signature.to_ecdsa() {
        Ok(sig) => secp.verify_ecdsa(&message, &sig, public_key).is_ok(),
        Err(_) => false,
    }
}
