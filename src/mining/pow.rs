//! Proof-of-work search and verification
//!
//! The puzzle is solved over a probe block whose timestamp is pinned to zero,
//! so any node can re-run the check from a stored block's nonce, previous
//! hash and transactions alone.

use crate::core::{Block, Transaction};
use crate::crypto::{meets_difficulty, Hash};
use tokio_util::sync::CancellationToken;

/// Check that `nonce` solves the puzzle for the given block contents
pub fn valid_proof(
    nonce: u64,
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: usize,
) -> bool {
    let probe = Block::probe(nonce, *previous_hash, transactions);
    meets_difficulty(&probe.hash(), difficulty)
}

/// Smallest nonce that solves the puzzle. Unbounded.
pub fn find_nonce(previous_hash: &Hash, transactions: &[Transaction], difficulty: usize) -> u64 {
    let mut nonce = 0u64;
    while !valid_proof(nonce, previous_hash, transactions, difficulty) {
        nonce += 1;
    }
    nonce
}

/// Same search as [`find_nonce`], checking `cancel` before every attempt.
///
/// Returns the nonce and the number of attempts, or `None` once cancelled.
pub fn find_nonce_until(
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: usize,
    cancel: &CancellationToken,
) -> Option<(u64, u64)> {
    let mut nonce = 0u64;
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        if valid_proof(nonce, previous_hash, transactions, difficulty) {
            return Some((nonce, nonce + 1));
        }
        nonce += 1;
    }
}
