//! minicoin: a minimal proof-of-work ledger node in Rust
//!
//! This crate provides:
//! - ECDSA signatures (secp256k1) over canonical transaction hashes
//! - Base58Check addresses derived from public keys
//! - A pool of admitted transactions mined into blocks by proof of work
//! - Longest-valid-chain conflict resolution against HTTP peers
//! - A REST API for clients and peer nodes
//!
//! # Example
//!
//! ```rust
//! use minicoin::core::{Blockchain, ChainConfig};
//! use minicoin::wallet::Wallet;
//!
//! let alice = Wallet::new();
//! let config = ChainConfig { difficulty: 2, ..ChainConfig::default() };
//! let mut blockchain = Blockchain::with_config(alice.address(), config);
//!
//! // Sign a transfer and admit it into the pool
//! let signed = alice.sign_transaction("bob", 1.5).unwrap();
//! assert!(blockchain.add_signed(&signed));
//!
//! // Mine it; alice receives the block reward
//! assert!(blockchain.mine());
//! println!("Balance: {}", alice.balance(&blockchain));
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;
pub mod wallet;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use core::{
    Block, Blockchain, BlockchainError, ChainConfig, Transaction, TransactionError,
    TransactionRequest,
};
pub use crypto::{derive_address, KeyPair, Signature};
pub use mining::{Mempool, Miner};
pub use network::{Node, NodeConfig};
pub use wallet::{Wallet, WalletError};
