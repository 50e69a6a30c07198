//! Longest-valid-chain conflict resolution
//!
//! Fetches every peer's chain concurrently and hands the candidates to
//! [`Blockchain::resolve_conflicts`]. Only one resolution runs at a time; a
//! trigger that arrives while one is in flight is skipped.

use crate::core::Blockchain;
use crate::network::client::PeerClient;
use crate::network::peer::PeerDirectory;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves chain conflicts against the peers of a directory
pub struct ConsensusResolver<D, C> {
    peers: Arc<D>,
    client: Arc<C>,
    resolving: AtomicBool,
}

/// Clears the in-flight flag when a resolution ends or is dropped mid-way
struct ResolvingGuard<'a>(&'a AtomicBool);

impl<'a> ResolvingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<D: PeerDirectory, C: PeerClient> ConsensusResolver<D, C> {
    pub fn new(peers: Arc<D>, client: Arc<C>) -> Self {
        Self {
            peers,
            client,
            resolving: AtomicBool::new(false),
        }
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving.load(Ordering::Acquire)
    }

    /// Replace `blockchain` with the longest valid peer chain, if one is
    /// strictly longer. Returns whether the local chain was replaced.
    pub async fn resolve(&self, blockchain: &RwLock<Blockchain>) -> bool {
        let _guard = match ResolvingGuard::acquire(&self.resolving) {
            Some(guard) => guard,
            None => {
                log::debug!("Conflict resolution already running, skipped");
                return false;
            }
        };

        let peers = self.peers.peers().await;
        let mut fetches = Vec::with_capacity(peers.len());
        for peer in &peers {
            fetches.push(self.client.fetch_chain(peer));
        }
        let results = join_all(fetches).await;

        let mut candidates = Vec::new();
        for (peer, result) in peers.iter().zip(results) {
            match result {
                Ok(chain) => candidates.push(chain),
                Err(e) => log::warn!("Failed to fetch chain from {}: {}", peer, e),
            }
        }

        let replaced = blockchain.write().await.resolve_conflicts(candidates);
        if replaced {
            log::info!("Resolve conflicts: chain replaced");
        } else {
            log::debug!("Resolve conflicts: local chain kept");
        }

        replaced
    }
}
