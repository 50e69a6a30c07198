//! Block implementation for the ledger
//!
//! A block records one mining round. Its hash is SHA-256 over the canonical
//! JSON encoding `{"timestamp","nonce","previous_hash","transactions"}`,
//! which is also the form in which blocks are exported to peers.

use crate::core::transaction::Transaction;
use crate::crypto::{canonical_hash, meets_difficulty, Hash};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Previous hash of the genesis block
pub const ZERO_HASH: Hash = [0u8; 32];

/// Timestamp used for proof-of-work probe blocks
pub const PROBE_TIMESTAMP: i64 = 0;

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Creation time, nanoseconds since the Unix epoch
    pub(crate) timestamp: i64,
    /// Proof-of-work solution
    pub(crate) nonce: u64,
    /// Hash of the preceding block
    #[serde(with = "hex_hash")]
    pub(crate) previous_hash: Hash,
    /// Ordered transactions; order is part of the hash
    pub(crate) transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block stamped with the current wall-clock time
    pub fn new(nonce: u64, previous_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(now_nanos(), nonce, previous_hash, transactions)
    }

    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The fixed genesis block shared by every node
    pub fn genesis() -> Self {
        Self::with_timestamp(PROBE_TIMESTAMP, 0, ZERO_HASH, Vec::new())
    }

    /// The zero-timestamp block that proof of work is computed over
    pub fn probe(nonce: u64, previous_hash: Hash, transactions: &[Transaction]) -> Self {
        Self::with_timestamp(PROBE_TIMESTAMP, nonce, previous_hash, transactions.to_vec())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Hash of the block including its timestamp
    pub fn hash(&self) -> Hash {
        canonical_hash(self)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// Proof-of-work hash: the same block with the timestamp pinned to zero
    pub fn probe_hash(&self) -> Hash {
        Self::probe(self.nonce, self.previous_hash, &self.transactions).hash()
    }

    /// Whether the probe hash meets `difficulty`
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        meets_difficulty(&self.probe_hash(), difficulty)
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Serializes a 32-byte hash as lowercase hex
mod hex_hash {
    use crate::crypto::Hash;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let mut hash = [0u8; 32];
        hex::decode_to_slice(&encoded, &mut hash).map_err(de::Error::custom)?;
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("A", "B", 1.0),
            Transaction::new("B", "C", 2.0),
        ]
    }

    #[test]
    fn test_make_block() {
        let block = Block::new(0, ZERO_HASH, Vec::new());
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.previous_hash(), &ZERO_HASH);
        assert!(block.transactions().is_empty());
        assert!(block.timestamp() > 0);
    }

    #[test]
    fn test_genesis_is_fixed() {
        assert_eq!(Block::genesis(), Block::genesis());
        assert_eq!(Block::genesis().hash(), Block::genesis().hash());
        assert_eq!(Block::genesis().timestamp(), PROBE_TIMESTAMP);
    }

    #[test]
    fn test_canonical_encoding() {
        let block = Block::with_timestamp(7, 42, ZERO_HASH, vec![Transaction::new("A", "B", 1.0)]);
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(
            json,
            format!(
                r#"{{"timestamp":7,"nonce":42,"previous_hash":"{}","transactions":[{{"sender_blockchain_address":"A","recipient_blockchain_address":"B","value":1.0}}]}}"#,
                "0".repeat(64)
            )
        );
    }

    #[test]
    fn test_timestamp_changes_hash() {
        let a = Block::with_timestamp(1, 5, ZERO_HASH, sample_transactions());
        let b = Block::with_timestamp(2, 5, ZERO_HASH, sample_transactions());
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.probe_hash(), b.probe_hash());
    }

    #[test]
    fn test_transaction_order_changes_hash() {
        let mut reversed = sample_transactions();
        reversed.reverse();

        let a = Block::with_timestamp(1, 5, ZERO_HASH, sample_transactions());
        let b = Block::with_timestamp(1, 5, ZERO_HASH, reversed);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_export_round_trip() {
        let block = Block::new(99, Block::genesis().hash(), sample_transactions());
        let json = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_rejects_malformed_previous_hash() {
        let json = r#"{"timestamp":0,"nonce":0,"previous_hash":"abcd","transactions":[]}"#;
        assert!(serde_json::from_str::<Block>(json).is_err());

        let json = format!(
            r#"{{"timestamp":0,"nonce":0,"previous_hash":"{}","transactions":[]}}"#,
            "zz".repeat(32)
        );
        assert!(serde_json::from_str::<Block>(&json).is_err());
    }
}
