//! Wallet implementation for the ledger
//!
//! Provides key management and signed transaction requests. The private key
//! stays with the wallet; only the address, public key and signature go into
//! a request.

use crate::core::{Blockchain, SignedTransaction, Transaction, TransactionRequest};
use crate::crypto::{KeyError, KeyPair};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f32),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A key pair together with its address
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    address: String,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self::from_key_pair(KeyPair::generate())
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self::from_key_pair(key_pair))
    }

    fn from_key_pair(key_pair: KeyPair) -> Self {
        let address = key_pair.address();
        Self { key_pair, address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Public key as hex of X‖Y
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Net amount this wallet has received on `blockchain`
    pub fn balance(&self, blockchain: &Blockchain) -> f32 {
        blockchain.calculate_balance(&self.address)
    }

    /// Sign a transfer from this wallet
    pub fn sign_transaction(&self, recipient: &str, value: f32) -> Result<SignedTransaction, WalletError> {
        if !value.is_finite() {
            return Err(WalletError::InvalidAmount(value));
        }

        let transaction = Transaction::new(&self.address, recipient, value);
        let signature = self.key_pair.sign(&transaction.digest());

        Ok(SignedTransaction {
            transaction,
            public_key: self.key_pair.public_key,
            signature,
        })
    }

    /// Wire request for a signed transfer from this wallet
    pub fn transaction_request(
        &self,
        recipient: &str,
        value: f32,
    ) -> Result<TransactionRequest, WalletError> {
        Ok(self.sign_transaction(recipient, value)?.to_request())
    }

    /// Export everything needed to restore the wallet
    pub fn export_keys(&self) -> WalletKeys {
        WalletKeys {
            private_key: self.private_key(),
            public_key: self.public_key(),
            address: self.address.clone(),
        }
    }

    /// Export wallet info (without private key)
    pub fn export_public_info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address.clone(),
            public_key: self.public_key(),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Full key material of a wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletKeys {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

/// Public wallet information (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub public_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NETWORK_SENDER;
    use crate::crypto::is_valid_address;

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new();
        assert!(is_valid_address(wallet.address()));
        assert_eq!(wallet.public_key().len(), 128);
        assert_eq!(wallet.private_key().len(), 64);
    }

    #[test]
    fn test_wallet_import() {
        let wallet1 = Wallet::new();
        let private_key = wallet1.private_key();

        let wallet2 = Wallet::from_private_key(&private_key).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(Wallet::from_private_key("not hex").is_err());
        assert!(Wallet::from_private_key(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_signed_request_is_admitted() {
        let wallet = Wallet::new();
        let request = wallet.transaction_request("bob", 2.5).unwrap();

        assert_eq!(request.sender_blockchain_address.as_deref(), Some(wallet.address()));
        assert_eq!(request.sender_public_key, Some(wallet.public_key()));

        let signed = request.parse().unwrap();
        assert!(signed.verify());

        let mut chain = Blockchain::new("miner");
        assert!(chain.add_signed(&signed));
        assert_eq!(chain.pool().len(), 1);
    }

    #[test]
    fn test_non_finite_amount() {
        let wallet = Wallet::new();
        assert!(matches!(
            wallet.sign_transaction("bob", f32::NAN),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_balance() {
        let wallet = Wallet::new();
        let mut chain = Blockchain::new(wallet.address());
        assert!(chain.add_transaction(NETWORK_SENDER, "bob", 1.0, None, None));
        assert!(chain.mine());

        assert_eq!(wallet.balance(&chain), 100.0);
    }

    #[test]
    fn test_export() {
        let wallet = Wallet::new();
        let keys = wallet.export_keys();
        let restored = Wallet::from_private_key(&keys.private_key).unwrap();
        assert_eq!(restored.address(), keys.address);

        let info = wallet.export_public_info();
        assert_eq!(info.public_key, keys.public_key);
    }
}
