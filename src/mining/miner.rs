//! Mining engine for the ledger
//!
//! A [`MiningJob`] is an owned snapshot of everything the proof-of-work search
//! needs, taken while the chain lock is held. The [`Miner`] solves it without
//! the lock, optionally on the blocking thread pool, and the chain publishes
//! the result afterwards.

use crate::core::Transaction;
use crate::crypto::Hash;
use crate::mining::pow::find_nonce_until;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Snapshot of the work for one block
#[derive(Debug, Clone)]
pub struct MiningJob {
    /// Hash of the chain tip the block will extend
    pub previous_hash: Hash,
    /// Pool snapshot followed by the reward transaction
    pub transactions: Vec<Transaction>,
    /// Leading hex zeros required of the probe hash
    pub difficulty: usize,
    /// Number of leading entries of `transactions` taken from the pool
    pub pool_len: usize,
}

impl MiningJob {
    /// The transactions that came out of the pool
    pub fn pool_transactions(&self) -> &[Transaction] {
        &self.transactions[..self.pool_len]
    }
}

/// Mining statistics
#[derive(Debug, Clone, Serialize)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u64,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// Runs proof-of-work searches that can be cancelled
#[derive(Debug, Clone, Default)]
pub struct Miner {
    cancel: CancellationToken,
}

impl Miner {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Abort any search in progress and every future one
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Solve a job on the current thread
    pub fn solve(&self, job: &MiningJob) -> Option<(u64, MiningStats)> {
        let start = Instant::now();

        info!(
            "Mining block with {} transactions at difficulty {}...",
            job.transactions.len(),
            job.difficulty
        );

        let (nonce, attempts) = find_nonce_until(
            &job.previous_hash,
            &job.transactions,
            job.difficulty,
            &self.cancel,
        )?;

        let elapsed = start.elapsed().as_millis() as u64;
        let hash_rate = if elapsed > 0 {
            (attempts as f64) / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };

        info!(
            "Found nonce {} in {}ms ({} attempts, {:.2} H/s)",
            nonce, elapsed, attempts, hash_rate
        );

        Some((
            nonce,
            MiningStats {
                hash_attempts: attempts,
                time_ms: elapsed,
                hash_rate,
            },
        ))
    }

    /// Solve a job on the blocking thread pool
    pub async fn solve_detached(&self, job: MiningJob) -> Option<(MiningJob, u64, MiningStats)> {
        let miner = self.clone();
        let result = tokio::task::spawn_blocking(move || {
            miner
                .solve(&job)
                .map(|(nonce, stats)| (job, nonce, stats))
        })
        .await;

        match result {
            Ok(solved) => solved,
            Err(e) => {
                warn!("Mining task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::ZERO_HASH;
    use crate::mining::pow::valid_proof;

    fn job(difficulty: usize) -> MiningJob {
        MiningJob {
            previous_hash: ZERO_HASH,
            transactions: vec![
                Transaction::new("A", "B", 1.0),
                Transaction::reward("miner", 100.0),
            ],
            difficulty,
            pool_len: 1,
        }
    }

    #[test]
    fn test_pool_transactions_exclude_reward() {
        let job = job(1);
        assert_eq!(job.pool_transactions(), &[Transaction::new("A", "B", 1.0)]);
    }

    #[test]
    fn test_solve() {
        let miner = Miner::default();
        let job = job(2);

        let (nonce, stats) = miner.solve(&job).unwrap();
        assert!(valid_proof(nonce, &job.previous_hash, &job.transactions, 2));
        assert_eq!(stats.hash_attempts, nonce + 1);
    }

    #[test]
    fn test_cancelled_miner() {
        let miner = Miner::default();
        miner.cancel();
        assert!(miner.is_cancelled());
        assert!(miner.solve(&job(64)).is_none());
    }

    #[tokio::test]
    async fn test_solve_detached() {
        let miner = Miner::default();
        let (job, nonce, _) = miner.solve_detached(job(2)).await.unwrap();
        assert!(valid_proof(nonce, &job.previous_hash, &job.transactions, 2));
    }
}
