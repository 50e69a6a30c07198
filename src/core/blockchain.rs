//! Blockchain implementation
//!
//! The chain owns its blocks and the pool of admitted transactions. Every
//! mutation goes through `&mut self`; callers that share a chain between tasks
//! wrap the whole struct in one lock so the pool and the block list always
//! change together.

use crate::core::block::Block;
use crate::core::transaction::{
    verify_signature, SignedTransaction, Transaction, TransactionError, NETWORK_SENDER,
};
use crate::crypto::{Hash, Signature};
use crate::mining::{find_nonce, valid_proof, Mempool, MiningJob};
use log::{debug, info, warn};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default mining difficulty (number of leading hex zeros)
pub const DEFAULT_DIFFICULTY: usize = 3;

/// Reward credited to the miner of each block
pub const MINING_REWARD: f32 = 100.0;

/// Blockchain-related errors
#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("Block {0}: previous hash does not match")]
    BrokenLink(usize),
    #[error("Block {0}: invalid proof of work")]
    InvalidProof(usize),
    #[error("Chain tip changed while mining")]
    StaleJob,
}

/// Consensus parameters of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Leading hex zeros required of a block's probe hash
    pub difficulty: usize,
    /// Value of the reward transaction in each mined block
    pub mining_reward: f32,
    /// Reject transfers exceeding the sender's mined balance
    pub require_sufficient_funds: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            require_sufficient_funds: false,
        }
    }
}

/// The ledger of one node
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    blocks: Vec<Block>,
    /// Admitted transactions not yet mined
    pool: Mempool,
    /// Account credited with mining rewards
    reward_address: String,
    config: ChainConfig,
}

impl Blockchain {
    /// Create a new blockchain with genesis block
    pub fn new(reward_address: &str) -> Self {
        Self::with_config(reward_address, ChainConfig::default())
    }

    pub fn with_config(reward_address: &str, config: ChainConfig) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            pool: Mempool::new(),
            reward_address: reward_address.to_string(),
            config,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks including genesis
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// A chain always holds at least its genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the latest block
    pub fn latest_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("Blockchain should have at least genesis block")
    }

    pub fn reward_address(&self) -> &str {
        &self.reward_address
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn pool(&self) -> &Mempool {
        &self.pool
    }

    /// Copies of the pending transactions
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.snapshot()
    }

    /// Admit a transaction into the pool.
    ///
    /// Transactions from the network sender skip signature verification;
    /// every other sender needs a public key and a signature that verify
    /// against the transaction. On rejection the pool is unchanged.
    pub fn try_add_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        value: f32,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> Result<(), TransactionError> {
        if !value.is_finite() {
            return Err(TransactionError::InvalidAmount(value));
        }

        let tx = Transaction::new(sender, recipient, value);

        if sender != NETWORK_SENDER {
            let (public_key, signature) = public_key
                .zip(signature)
                .ok_or(TransactionError::MissingSignature)?;

            if !verify_signature(public_key, signature, &tx) {
                return Err(TransactionError::InvalidSignature);
            }

            if self.config.require_sufficient_funds {
                let have = self.calculate_balance(sender);
                if have < value {
                    return Err(TransactionError::InsufficientFunds { have, need: value });
                }
            }
        }

        debug!("Admitted transaction {} -> {}: {}", sender, recipient, value);
        self.pool.add_transaction(tx);
        Ok(())
    }

    /// [`Self::try_add_transaction`] reporting only success
    pub fn add_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        value: f32,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        match self.try_add_transaction(sender, recipient, value, public_key, signature) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected transaction {} -> {}: {}", sender, recipient, e);
                false
            }
        }
    }

    /// Admit a transaction carried by a parsed request
    pub fn add_signed(&mut self, signed: &SignedTransaction) -> bool {
        let tx = &signed.transaction;
        self.add_transaction(
            tx.sender(),
            tx.recipient(),
            tx.value(),
            Some(&signed.public_key),
            Some(&signed.signature),
        )
    }

    /// Drop all pending transactions
    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    /// Snapshot the work for the next block, or `None` if the pool is empty
    pub fn mining_job(&self) -> Option<MiningJob> {
        if self.pool.is_empty() {
            return None;
        }

        let mut transactions = self.pool.snapshot();
        let pool_len = transactions.len();
        transactions.push(Transaction::reward(
            &self.reward_address,
            self.config.mining_reward,
        ));

        Some(MiningJob {
            previous_hash: self.latest_block().hash(),
            transactions,
            difficulty: self.config.difficulty,
            pool_len,
        })
    }

    /// Append the block for a solved job and remove its transactions from the
    /// pool.
    ///
    /// Fails if the tip is no longer the block the job was built on.
    pub fn commit_mined(&mut self, job: MiningJob, nonce: u64) -> Result<&Block, BlockchainError> {
        if self.latest_block().hash() != job.previous_hash {
            return Err(BlockchainError::StaleJob);
        }

        self.pool.remove_mined(job.pool_transactions());
        self.blocks
            .push(Block::new(nonce, job.previous_hash, job.transactions));

        info!("Mined block {}", self.blocks.len() - 1);
        Ok(self.latest_block())
    }

    /// Mine the pool into a new block on the current thread
    pub fn mine(&mut self) -> bool {
        let job = match self.mining_job() {
            Some(job) => job,
            None => {
                debug!("No transactions, mining skipped");
                return false;
            }
        };

        let nonce = find_nonce(&job.previous_hash, &job.transactions, job.difficulty);
        self.commit_mined(job, nonce).is_ok()
    }

    /// Net amount received by `address` over the whole ledger
    pub fn calculate_balance(&self, address: &str) -> f32 {
        let mut total = 0.0f32;

        for block in &self.blocks {
            for tx in block.transactions() {
                if tx.recipient() == address {
                    total += tx.value();
                }
                if tx.sender() == address {
                    total -= tx.value();
                }
            }
        }

        total
    }

    /// Copies of all blocks, genesis first
    pub fn export_chain(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    /// Check linkage and proof of work from index 1 onwards.
    ///
    /// The genesis block is taken as given and never checked.
    pub fn validate_chain(blocks: &[Block], difficulty: usize) -> Result<(), BlockchainError> {
        if blocks.is_empty() {
            return Err(BlockchainError::InvalidChain("empty chain".to_string()));
        }

        for (index, pair) in blocks.windows(2).enumerate() {
            let (previous, block) = (&pair[0], &pair[1]);

            if block.previous_hash() != &previous.hash() {
                return Err(BlockchainError::BrokenLink(index + 1));
            }

            if !valid_proof(
                block.nonce(),
                block.previous_hash(),
                block.transactions(),
                difficulty,
            ) {
                return Err(BlockchainError::InvalidProof(index + 1));
            }
        }

        Ok(())
    }

    pub fn is_valid_chain(blocks: &[Block], difficulty: usize) -> bool {
        Self::validate_chain(blocks, difficulty).is_ok()
    }

    /// Validate the local chain
    pub fn is_valid(&self) -> bool {
        Self::is_valid_chain(&self.blocks, self.config.difficulty)
    }

    /// Replace the local chain with `candidate` if it is strictly longer and
    /// valid.
    pub fn import_and_compare(&mut self, candidate: Vec<Block>) -> bool {
        self.resolve_conflicts(std::iter::once(candidate))
    }

    /// Adopt the longest valid chain among `candidates`, if any is strictly
    /// longer than the local one.
    ///
    /// Pending transactions are left in the pool even if the adopted chain
    /// already contains them.
    pub fn resolve_conflicts<I>(&mut self, candidates: I) -> bool
    where
        I: IntoIterator<Item = Vec<Block>>,
    {
        let mut max_length = self.blocks.len();
        let mut longest: Option<Vec<Block>> = None;

        for candidate in candidates {
            if candidate.len() <= max_length {
                continue;
            }

            match Self::validate_chain(&candidate, self.config.difficulty) {
                Ok(()) => {
                    max_length = candidate.len();
                    longest = Some(candidate);
                }
                Err(e) => debug!("Discarding candidate chain of length {}: {}", candidate.len(), e),
            }
        }

        match longest {
            Some(chain) => {
                info!(
                    "Replacing chain of length {} with length {}",
                    self.blocks.len(),
                    chain.len()
                );
                self.blocks = chain;
                true
            }
            None => false,
        }
    }

    /// Get chain statistics
    pub fn stats(&self) -> ChainStats {
        let total_transactions: usize = self.blocks.iter().map(|b| b.transactions().len()).sum();

        ChainStats {
            height: self.blocks.len() as u64 - 1,
            total_blocks: self.blocks.len() as u64,
            total_transactions: total_transactions as u64,
            pending_transactions: self.pool.len() as u64,
            difficulty: self.config.difficulty,
            latest_hash: self.latest_block().hash_hex(),
        }
    }

    /// Hash of the current tip
    pub fn tip_hash(&self) -> Hash {
        self.latest_block().hash()
    }
}

/// Chain statistics
#[derive(Debug, Clone, Serialize)]
pub struct ChainStats {
    pub height: u64,
    pub total_blocks: u64,
    pub total_transactions: u64,
    pub pending_transactions: u64,
    pub difficulty: usize,
    pub latest_hash: String,
}
