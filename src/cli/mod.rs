//! Command handlers for the `minicoin` binary

pub mod commands;

pub use commands::{cmd_validate, cmd_wallet_new, cmd_wallet_show, cmd_wallet_sign, run_node, CliResult};
