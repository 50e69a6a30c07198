//! minicoin node and wallet CLI
//!
//! Runs a ledger node with its REST API, or handles wallet keys offline.

use clap::{Parser, Subcommand};
use minicoin::cli;
use minicoin::core::{ChainConfig, DEFAULT_DIFFICULTY, MINING_REWARD};
use minicoin::network::NodeConfig;
use minicoin::wallet::Wallet;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "minicoin")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A minimal proof-of-work ledger node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a node
    Node {
        /// Port for the REST API
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Peer base URL, e.g. 127.0.0.1:5001 (repeatable)
        #[arg(long = "peer")]
        peers: Vec<String>,

        /// Address credited with mining rewards (a fresh wallet if omitted)
        #[arg(short, long)]
        reward_address: Option<String>,

        /// Mining difficulty (leading hex zeros)
        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,

        /// Reward per mined block
        #[arg(long, default_value_t = MINING_REWARD)]
        reward: f32,

        /// Start the periodic miner right away
        #[arg(long)]
        mine: bool,

        /// Seconds between mining rounds
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u64).range(1..))]
        mine_interval: u64,

        /// Seconds between conflict resolution rounds
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u64).range(1..))]
        sync_interval: u64,

        /// Timeout in seconds for each peer request
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
        peer_timeout: u64,

        /// Reject transfers exceeding the sender's balance
        #[arg(long)]
        require_funds: bool,
    },

    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Validate an exported chain file
    Validate {
        /// File holding a `GET /chain` response
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a new wallet
    New,

    /// Show the address of a private key
    Show {
        #[arg(short, long)]
        private_key: String,
    },

    /// Sign a transfer and print the request body
    Sign {
        #[arg(short, long)]
        private_key: String,

        /// Recipient's address
        #[arg(short, long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: f32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node {
            port,
            peers,
            reward_address,
            difficulty,
            reward,
            mine,
            mine_interval,
            sync_interval,
            peer_timeout,
            require_funds,
        } => {
            let reward_address = match reward_address {
                Some(address) => address,
                None => {
                    let wallet = Wallet::new();
                    println!("🔐 No reward address given, generated a wallet");
                    println!("   🗝️  Private Key: {}", wallet.private_key());
                    wallet.address().to_string()
                }
            };

            let config = NodeConfig {
                port,
                peers,
                mining_interval: Duration::from_secs(mine_interval),
                sync_interval: Duration::from_secs(sync_interval),
                peer_timeout: Duration::from_secs(peer_timeout),
                chain: ChainConfig {
                    difficulty,
                    mining_reward: reward,
                    require_sufficient_funds: require_funds,
                },
            };

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::run_node(config, &reward_address, mine))?;
        }

        Commands::Wallet { action } => match action {
            WalletCommands::New => cli::cmd_wallet_new()?,
            WalletCommands::Show { private_key } => cli::cmd_wallet_show(&private_key)?,
            WalletCommands::Sign {
                private_key,
                to,
                amount,
            } => cli::cmd_wallet_sign(&private_key, &to, amount)?,
        },

        Commands::Validate { input, difficulty } => {
            cli::cmd_validate(&input, difficulty)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let cli = Cli::try_parse_from(["minicoin", "node"]).unwrap();
        match cli.command {
            Commands::Node {
                port,
                mine_interval,
                sync_interval,
                peer_timeout,
                ..
            } => {
                assert_eq!(port, 5000);
                assert_eq!(mine_interval, 20);
                assert_eq!(sync_interval, 20);
                assert_eq!(peer_timeout, 5);
            }
            _ => panic!("expected the node command"),
        }
    }

    #[test]
    fn test_zero_intervals_rejected() {
        for flag in ["--mine-interval", "--sync-interval", "--peer-timeout"] {
            assert!(Cli::try_parse_from(["minicoin", "node", flag, "0"]).is_err());
            assert!(Cli::try_parse_from(["minicoin", "node", flag, "1"]).is_ok());
        }
    }
}
