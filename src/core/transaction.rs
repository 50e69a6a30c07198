//! Value-transfer transactions
//!
//! A transaction is an immutable `(sender, recipient, value)` triple. It has
//! no identifier: two transactions with the same content are equal. The
//! signature travels next to it in a [`TransactionRequest`] and is dropped
//! once the transaction has been admitted to a pool.

use crate::crypto::{
    canonical_bytes, canonical_hash, public_key_from_hex, public_key_to_hex, verify_digest, Hash,
    KeyError, Signature,
};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved sender identifier for mining rewards
pub const NETWORK_SENDER: &str = "THE BLOCKCHAIN";

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Missing public key or signature")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid amount: {0}")]
    InvalidAmount(f32),
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: f32, need: f32 },
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A transfer of `value` from `sender` to `recipient`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "sender_blockchain_address")]
    sender: String,
    #[serde(rename = "recipient_blockchain_address")]
    recipient: String,
    value: f32,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, value: f32) -> Self {
        Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            value,
        }
    }

    /// Mining reward paid by the network to `recipient`
    pub fn reward(recipient: &str, value: f32) -> Self {
        Self::new(NETWORK_SENDER, recipient, value)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Whether the network is the sender
    pub fn is_reward(&self) -> bool {
        self.sender == NETWORK_SENDER
    }

    /// Canonical JSON encoding, the signed payload
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(self)
    }

    /// SHA-256 of the canonical encoding
    pub fn digest(&self) -> Hash {
        canonical_hash(self)
    }
}

/// Check `signature` over the transaction's canonical digest
pub fn verify_signature(
    public_key: &PublicKey,
    signature: &Signature,
    transaction: &Transaction,
) -> bool {
    verify_digest(public_key, &transaction.digest(), signature)
}

/// Wire form of a signed transaction submitted to a node.
///
/// Every field is optional on the wire so that incomplete requests can be
/// told apart from malformed ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub signature: Option<String>,
    pub value: Option<f32>,
}

/// A transaction together with the key material that authorizes it
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn verify(&self) -> bool {
        verify_signature(&self.public_key, &self.signature, &self.transaction)
    }

    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some(self.transaction.sender.clone()),
            recipient_blockchain_address: Some(self.transaction.recipient.clone()),
            sender_public_key: Some(public_key_to_hex(&self.public_key)),
            signature: Some(self.signature.to_string()),
            value: Some(self.transaction.value),
        }
    }
}

impl TransactionRequest {
    /// Decode the key material and build the transaction it carries
    pub fn parse(&self) -> Result<SignedTransaction, TransactionError> {
        let sender = self
            .sender_blockchain_address
            .as_deref()
            .ok_or(TransactionError::MissingField("sender_blockchain_address"))?;
        let recipient = self
            .recipient_blockchain_address
            .as_deref()
            .ok_or(TransactionError::MissingField("recipient_blockchain_address"))?;
        let public_key = self
            .sender_public_key
            .as_deref()
            .ok_or(TransactionError::MissingField("sender_public_key"))?;
        let signature = self
            .signature
            .as_deref()
            .ok_or(TransactionError::MissingField("signature"))?;
        let value = self.value.ok_or(TransactionError::MissingField("value"))?;

        Ok(SignedTransaction {
            transaction: Transaction::new(sender, recipient, value),
            public_key: public_key_from_hex(public_key)?,
            signature: signature.parse()?,
        })
    }
}
