//! Peer networking
//!
//! Nodes talk to each other over the same REST surface clients use:
//! - Peer directory (a swappable list of peer base URLs)
//! - HTTP peer client (chain fetch, transaction relay, notifications)
//! - Consensus resolver (longest valid chain wins)
//! - Node (shared chain, relay and periodic tasks)

pub mod client;
pub mod consensus;
pub mod node;
pub mod peer;

pub use client::{ChainResponse, HttpPeerClient, PeerClient, PeerError, DEFAULT_PEER_TIMEOUT};
pub use consensus::ConsensusResolver;
pub use node::{
    ConfigError, Node, NodeConfig, NodeStatus, DEFAULT_MINING_INTERVAL, DEFAULT_SYNC_INTERVAL,
};
pub use peer::{normalize_peer, PeerDirectory, StaticPeers};
