//! Account identifiers derived from public keys
//!
//! `Base58(0x00 ‖ SHA256(SHA256(X ‖ Y))[..20] ‖ checksum)`, where the
//! checksum is the first four bytes of a double SHA-256 over the versioned
//! payload.

use secp256k1::PublicKey;

use super::hash::{double_sha256, sha256};
use super::keys::{public_key_coordinates, SCALAR_SIZE};

/// Version byte prepended to every address payload
pub const ADDRESS_VERSION: u8 = 0x00;

/// Bytes taken from the second digest
const PAYLOAD_HASH_SIZE: usize = 20;

/// Version byte plus truncated digest
pub const VERSIONED_PAYLOAD_SIZE: usize = 1 + PAYLOAD_HASH_SIZE;

/// Checksum bytes appended to the payload
pub const CHECKSUM_SIZE: usize = 4;

/// Total decoded length of an address
pub const ADDRESS_BYTES: usize = VERSIONED_PAYLOAD_SIZE + CHECKSUM_SIZE;

/// Derive the account identifier for a public key
pub fn derive_address(public_key: &PublicKey) -> String {
    let (x, y) = public_key_coordinates(public_key);
    derive_address_from_coordinates(&x, &y)
}

/// Derive the account identifier from raw affine coordinates
pub fn derive_address_from_coordinates(x: &[u8; SCALAR_SIZE], y: &[u8; SCALAR_SIZE]) -> String {
    let mut coordinates = Vec::with_capacity(2 * SCALAR_SIZE);
    coordinates.extend_from_slice(x);
    coordinates.extend_from_slice(y);

    let digest = sha256(&sha256(&coordinates));

    let mut address_bytes = Vec::with_capacity(ADDRESS_BYTES);
    address_bytes.push(ADDRESS_VERSION);
    address_bytes.extend_from_slice(&digest[..PAYLOAD_HASH_SIZE]);

    let checksum = double_sha256(&address_bytes);
    address_bytes.extend_from_slice(&checksum[..CHECKSUM_SIZE]);

    bs58::encode(address_bytes).into_string()
}

/// Check that a string decodes to a well-formed address with a valid checksum
pub fn is_valid_address(address: &str) -> bool {
    let bytes = match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    if bytes.len() != ADDRESS_BYTES || bytes[0] != ADDRESS_VERSION {
        return false;
    }

    let (payload, checksum) = bytes.split_at(VERSIONED_PAYLOAD_SIZE);
    double_sha256(payload)[..CHECKSUM_SIZE] == *checksum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn generator() -> ([u8; 32], [u8; 32]) {
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        hex::decode_to_slice(
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            &mut x,
        )
        .unwrap();
        hex::decode_to_slice(
            "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
            &mut y,
        )
        .unwrap();
        (x, y)
    }

    #[test]
    fn test_known_vector() {
        let (x, y) = generator();
        assert_eq!(
            derive_address_from_coordinates(&x, &y),
            "1MBffmhJjXY6gMDsJceYsuuUh4ihckp2EM"
        );
    }

    #[test]
    fn test_address_is_deterministic() {
        let kp = KeyPair::generate();
        assert_eq!(derive_address(&kp.public_key), derive_address(&kp.public_key));
        assert_eq!(kp.address(), derive_address(&kp.public_key));
    }

    #[test]
    fn test_single_bit_changes_address() {
        let (x, y) = generator();
        let original = derive_address_from_coordinates(&x, &y);

        let mut flipped_x = x;
        flipped_x[31] ^= 0x01;
        assert_ne!(derive_address_from_coordinates(&flipped_x, &y), original);

        let mut flipped_y = y;
        flipped_y[0] ^= 0x80;
        assert_ne!(derive_address_from_coordinates(&x, &flipped_y), original);
    }

    #[test]
    fn test_address_layout() {
        let address = KeyPair::generate().address();
        let bytes = bs58::decode(&address).into_vec().unwrap();

        assert_eq!(bytes.len(), ADDRESS_BYTES);
        assert_eq!(bytes[0], ADDRESS_VERSION);
        // Leading zero byte renders as '1' in base58
        assert!(address.starts_with('1'));
        assert!(is_valid_address(&address));
    }

    #[test]
    fn test_invalid_addresses() {
        let address = KeyPair::generate().address();
        let mut bytes = bs58::decode(&address).into_vec().unwrap();
        bytes[ADDRESS_BYTES - 1] ^= 0x01;

        assert!(!is_valid_address(&bs58::encode(bytes).into_string()));
        assert!(!is_valid_address("THE BLOCKCHAIN"));
        assert!(!is_valid_address(""));
    }
}
