//! Transaction pool (mempool) for pending transactions
//!
//! Holds transactions that have been admitted but not yet mined, in arrival
//! order. Transactions carry no identifier, so removal after mining is by
//! content: each mined transaction removes one equal pool entry.

use crate::core::Transaction;
use serde::Serialize;

/// Entry in the mempool with metadata
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    /// The transaction
    pub tx: Transaction,
    /// When the transaction was added (Unix timestamp)
    pub added_time: i64,
}

impl MempoolEntry {
    pub fn new(tx: Transaction, added_time: i64) -> Self {
        Self { tx, added_time }
    }
}

/// Mempool statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MempoolStats {
    pub count: usize,
    pub total_value: f32,
    pub oldest_time: Option<i64>,
}

/// Pending transactions waiting for the next block
#[derive(Debug, Default, Clone)]
pub struct Mempool {
    /// Entries in order of arrival
    entries: Vec<MempoolEntry>,
}

impl Mempool {
    /// Create a new mempool
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an admitted transaction
    pub fn add_transaction(&mut self, tx: Transaction) {
        let added_time = chrono::Utc::now().timestamp();
        self.entries.push(MempoolEntry::new(tx, added_time));
    }

    /// Owned copies of every pending transaction, in arrival order
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.entries.iter().map(|e| e.tx.clone()).collect()
    }

    /// Remove transactions that are now in a block.
    ///
    /// Entries admitted after the snapshot was taken stay in the pool.
    pub fn remove_mined(&mut self, mined: &[Transaction]) -> usize {
        let mut removed = 0;
        for tx in mined {
            if let Some(pos) = self.entries.iter().position(|e| &e.tx == tx) {
                self.entries.remove(pos);
                removed += 1;
            }
        }
        removed
    }

    /// Drop every pending transaction
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.entries.iter().any(|e| &e.tx == tx)
    }

    /// Get mempool statistics
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            count: self.entries.len(),
            total_value: self.entries.iter().map(|e| e.tx.value()).sum(),
            oldest_time: self.entries.iter().map(|e| e.added_time).min(),
        }
    }
}
