//! Wallet module for key and transaction management

pub mod wallet;

pub use wallet::{Wallet, WalletError, WalletInfo, WalletKeys};
