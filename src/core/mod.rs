//! Core ledger components
//!
//! - Transactions (value transfers and signed requests)
//! - Blocks (with proof of work over a zero-timestamp probe)
//! - Blockchain (chain, pending pool, validation and conflict resolution)

pub mod block;
pub mod blockchain;
pub mod transaction;

pub use block::{Block, PROBE_TIMESTAMP, ZERO_HASH};
pub use blockchain::{
    Blockchain, BlockchainError, ChainConfig, ChainStats, DEFAULT_DIFFICULTY, MINING_REWARD,
};
pub use transaction::{
    verify_signature, SignedTransaction, Transaction, TransactionError, TransactionRequest,
    NETWORK_SENDER,
};
