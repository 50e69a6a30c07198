//! Mining module for block creation and transaction pooling

pub mod mempool;
pub mod miner;
pub mod pow;

pub use mempool::{Mempool, MempoolEntry, MempoolStats};
pub use miner::{Miner, MiningJob, MiningStats};
pub use pow::{find_nonce, find_nonce_until, valid_proof};
