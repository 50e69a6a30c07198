//! Node orchestration
//!
//! A [`Node`] owns the shared chain and wires it to the peer network:
//! admitted transactions are relayed, mined blocks trigger pool-clear and
//! consensus notifications, and two optional interval tasks drive mining and
//! conflict resolution.

use crate::core::{
    Block, Blockchain, ChainConfig, ChainStats, Transaction, TransactionError, TransactionRequest,
};
use crate::mining::{MempoolStats, Miner, MiningStats};
use crate::network::client::{HttpPeerClient, PeerClient, DEFAULT_PEER_TIMEOUT};
use crate::network::consensus::ConsensusResolver;
use crate::network::peer::{PeerDirectory, StaticPeers};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default interval between mining rounds
pub const DEFAULT_MINING_INTERVAL: Duration = Duration::from_secs(20);

/// Default interval between conflict resolution rounds
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(20);

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Port the REST API listens on
    pub port: u16,
    /// Peer base URLs
    pub peers: Vec<String>,
    pub mining_interval: Duration,
    pub sync_interval: Duration,
    /// Bound on each outbound peer call
    pub peer_timeout: Duration,
    pub chain: ChainConfig,
}

/// Configuration rejected before a node starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl NodeConfig {
    /// Check the intervals and timeout the background tasks depend on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mining_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("mining interval"));
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("sync interval"));
        }
        if self.peer_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("peer timeout"));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            peers: Vec::new(),
            mining_interval: DEFAULT_MINING_INTERVAL,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            chain: ChainConfig::default(),
        }
    }
}

/// Node status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub chain: ChainStats,
    pub mempool: MempoolStats,
    /// Search statistics of the last block this node mined
    pub last_mined: Option<MiningStats>,
    pub peers: usize,
    pub mining: bool,
    pub reward_address: String,
}

/// A ledger node and its peer network
pub struct Node<D = StaticPeers, C = HttpPeerClient> {
    pub config: NodeConfig,
    blockchain: Arc<RwLock<Blockchain>>,
    peers: Arc<D>,
    client: Arc<C>,
    resolver: ConsensusResolver<D, C>,
    miner: Miner,
    last_mined: RwLock<Option<MiningStats>>,
    shutdown: CancellationToken,
    mining_started: AtomicBool,
}

impl Node {
    /// Create a node talking HTTP to the configured peers
    pub fn new(config: NodeConfig, reward_address: &str) -> Self {
        let blockchain = Blockchain::with_config(reward_address, config.chain.clone());
        let peers = Arc::new(StaticPeers::new(config.peers.clone()));
        let client = Arc::new(HttpPeerClient::new(config.peer_timeout));
        Self::with_parts(config, blockchain, peers, client)
    }
}

impl<D: PeerDirectory, C: PeerClient> Node<D, C> {
    pub fn with_parts(
        config: NodeConfig,
        blockchain: Blockchain,
        peers: Arc<D>,
        client: Arc<C>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            config,
            blockchain: Arc::new(RwLock::new(blockchain)),
            resolver: ConsensusResolver::new(peers.clone(), client.clone()),
            peers,
            client,
            miner: Miner::new(shutdown.child_token()),
            last_mined: RwLock::new(None),
            shutdown,
            mining_started: AtomicBool::new(false),
        }
    }

    /// The shared chain
    pub fn blockchain(&self) -> Arc<RwLock<Blockchain>> {
        self.blockchain.clone()
    }

    pub fn peers(&self) -> Arc<D> {
        self.peers.clone()
    }

    /// Admit a transaction submitted by a client and relay it to every peer
    pub async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<(), TransactionError> {
        self.admit(&request).await?;
        self.broadcast_transaction(request);
        Ok(())
    }

    /// Admit a transaction relayed by a peer, without relaying it further
    pub async fn relay_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<(), TransactionError> {
        self.admit(request).await
    }

    async fn admit(&self, request: &TransactionRequest) -> Result<(), TransactionError> {
        let signed = request.parse()?;
        let tx = &signed.transaction;

        self.blockchain.write().await.try_add_transaction(
            tx.sender(),
            tx.recipient(),
            tx.value(),
            Some(&signed.public_key),
            Some(&signed.signature),
        )
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.blockchain.read().await.pending_transactions()
    }

    pub async fn clear_pool(&self) {
        self.blockchain.write().await.clear_pool();
        log::debug!("Transaction pool cleared");
    }

    pub async fn balance(&self, address: &str) -> f32 {
        self.blockchain.read().await.calculate_balance(address)
    }

    pub async fn export_chain(&self) -> Vec<Block> {
        self.blockchain.read().await.export_chain()
    }

    /// Mine the pool into one block.
    ///
    /// The search runs without the chain lock; transactions admitted
    /// meanwhile wait for the next round. Returns false if the pool was
    /// empty, the search was cancelled, or the tip moved before publishing.
    pub async fn mine(&self) -> bool {
        let job = match self.blockchain.read().await.mining_job() {
            Some(job) => job,
            None => {
                log::debug!("No transactions, mining skipped");
                return false;
            }
        };

        let (job, nonce, stats) = match self.miner.solve_detached(job).await {
            Some(solved) => solved,
            None => return false,
        };

        let height = {
            let mut chain = self.blockchain.write().await;
            if let Err(e) = chain.commit_mined(job, nonce) {
                log::warn!("Mined block discarded: {}", e);
                return false;
            }
            chain.len() - 1
        };

        log::info!("Block {} added to chain", height);
        *self.last_mined.write().await = Some(stats);
        self.notify_block_mined();
        true
    }

    /// Adopt the longest valid chain among the peers
    pub async fn resolve_conflicts(&self) -> bool {
        self.resolver.resolve(&self.blockchain).await
    }

    pub async fn status(&self) -> NodeStatus {
        let peers = self.peers.peers().await.len();
        let last_mined = self.last_mined.read().await.clone();
        let chain = self.blockchain.read().await;
        NodeStatus {
            chain: chain.stats(),
            mempool: chain.pool().stats(),
            last_mined,
            peers,
            mining: self.mining_started.load(Ordering::SeqCst),
            reward_address: chain.reward_address().to_string(),
        }
    }

    /// Start mining every `mining_interval`. Returns `None` if already started.
    pub fn start_mining(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.mining_started.swap(true, Ordering::SeqCst) {
            return None;
        }

        let node = self.clone();
        let period = self.config.mining_interval;
        log::info!("Mining every {:?}", period);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = node.shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        node.mine().await;
                    }
                }
            }
        }))
    }

    /// Resolve conflicts every `sync_interval`
    pub fn start_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let node = self.clone();
        let period = self.config.sync_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = node.shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        node.resolve_conflicts().await;
                    }
                }
            }
        })
    }

    /// Stop the interval tasks and abort any search in progress
    pub fn shutdown(&self) {
        log::info!("Shutting down node...");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn broadcast_transaction(&self, request: TransactionRequest) {
        let peers = self.peers.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            for peer in peers.peers().await {
                if let Err(e) = client.broadcast_transaction(&peer, &request).await {
                    log::warn!("Failed to relay transaction to {}: {}", peer, e);
                }
            }
        });
    }

    fn notify_block_mined(&self) {
        let peers = self.peers.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            for peer in peers.peers().await {
                if let Err(e) = client.notify_pool_cleared(&peer).await {
                    log::warn!("Failed to clear pool on {}: {}", peer, e);
                }
                if let Err(e) = client.notify_block_mined(&peer).await {
                    log::warn!("Failed to trigger consensus on {}: {}", peer, e);
                }
            }
        });
    }
}
