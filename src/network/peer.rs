//! Peer directory
//!
//! The node only ever reads a snapshot of peer base URLs. Keeping the list
//! current (scanning, discovery) is somebody else's job: it calls
//! [`StaticPeers::replace`] and the next round picks the new list up.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Source of peer base URLs such as `http://127.0.0.1:5001`
pub trait PeerDirectory: Send + Sync + 'static {
    fn peers(&self) -> impl Future<Output = Vec<String>> + Send;
}

/// A peer list that can be swapped out at runtime
#[derive(Debug, Clone, Default)]
pub struct StaticPeers {
    peers: Arc<RwLock<Vec<String>>>,
}

impl StaticPeers {
    pub fn new(peers: Vec<String>) -> Self {
        Self {
            peers: Arc::new(RwLock::new(normalize_all(peers))),
        }
    }

    /// Replace the whole list
    pub async fn replace(&self, peers: Vec<String>) {
        let peers = normalize_all(peers);
        log::debug!("Peer list updated: {:?}", peers);
        *self.peers.write().await = peers;
    }
}

/// Peers are reached over plain HTTP only; other schemes are dropped
fn normalize_all(peers: Vec<String>) -> Vec<String> {
    peers
        .into_iter()
        .filter_map(|peer| {
            let normalized = normalize_peer(&peer);
            if normalized.is_none() {
                log::warn!("Ignoring peer {}: only http:// is supported", peer);
            }
            normalized
        })
        .collect()
}

impl PeerDirectory for StaticPeers {
    async fn peers(&self) -> Vec<String> {
        self.peers.read().await.clone()
    }
}

/// Prefix bare `host:port` entries with `http://` and drop a trailing slash.
/// Returns `None` for any other scheme.
pub fn normalize_peer(peer: &str) -> Option<String> {
    let peer = peer.trim().trim_end_matches('/');
    if peer.starts_with("http://") {
        Some(peer.to_string())
    } else if peer.contains("://") {
        None
    } else {
        Some(format!("http://{}", peer))
    }
}
