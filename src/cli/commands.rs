//! CLI commands for the node binary
//!
//! Implements the command handlers behind `main`.

use crate::api::{create_router, ApiState};
use crate::core::Blockchain;
use crate::network::client::ChainResponse;
use crate::network::{Node, NodeConfig};
use crate::wallet::Wallet;
use std::path::Path;
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Run a node: REST API, conflict resolution and optionally the miner,
/// until Ctrl+C
pub async fn run_node(config: NodeConfig, reward_address: &str, mine: bool) -> CliResult<()> {
    config.validate()?;
    let port = config.port;
    let node = Arc::new(Node::new(config, reward_address));

    println!("🌐 Starting node on port {}...", port);
    println!("   💰 Reward address: {}", reward_address);
    println!("   🔧 Difficulty: {}", node.config.chain.difficulty);
    if !node.config.peers.is_empty() {
        println!("   Peers: {:?}", node.config.peers);
    }

    let sync = node.start_sync();
    let miner = if mine { node.start_mining() } else { None };

    let app = create_router(ApiState::new(node.clone()));
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 REST API listening on http://localhost:{}", port);

    let shutdown_node = node.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            println!("\n📴 Shutting down node...");
            shutdown_node.shutdown();
        })
        .await?;

    sync.await?;
    if let Some(miner) = miner {
        miner.await?;
    }

    Ok(())
}

/// Create a new wallet and print its keys
pub fn cmd_wallet_new() -> CliResult<()> {
    let wallet = Wallet::new();

    println!("🔐 New wallet created!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔑 Public Key: {}", wallet.public_key());
    println!("   🗝️  Private Key: {}", wallet.private_key());
    println!("\n   ⚠️  IMPORTANT: Store the private key safely, it is not saved anywhere.");

    Ok(())
}

/// Show the address and public key behind a private key
pub fn cmd_wallet_show(private_key: &str) -> CliResult<()> {
    let info = Wallet::from_private_key(private_key)?.export_public_info();
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Print a signed transaction request ready for `POST /transactions`
pub fn cmd_wallet_sign(private_key: &str, recipient: &str, value: f32) -> CliResult<()> {
    let wallet = Wallet::from_private_key(private_key)?;
    let request = wallet.transaction_request(recipient, value)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// Validate an exported chain (`{"blocks": [...]}`) read from a file
pub fn cmd_validate(path: &Path, difficulty: usize) -> CliResult<()> {
    let data = std::fs::read_to_string(path)?;
    let chain: ChainResponse = serde_json::from_str(&data)?;

    println!("🔍 Validating {} blocks from {:?}...", chain.blocks.len(), path);

    match Blockchain::validate_chain(&chain.blocks, difficulty) {
        Ok(()) => {
            println!("✅ Blockchain is valid!");
            println!("   {} blocks verified", chain.blocks.len());
        }
        Err(e) => {
            println!("❌ Blockchain validation FAILED!");
            println!("   {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
