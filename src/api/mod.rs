//! REST API module
//!
//! Provides the HTTP surface used by clients and by peer nodes.
//!
//! # Endpoints
//!
//! ## Chain
//! - `GET /` and `GET /chain` - Export the chain as `{"blocks": [...]}`
//! - `GET /health` - Liveness
//! - `GET /status` - Height, pool size, peers, miner state
//!
//! ## Transactions
//! - `GET /transactions` - List pending transactions
//! - `POST /transactions` - Submit a signed transaction (relayed to peers)
//! - `PUT /transactions` - Accept a transaction relayed by a peer
//! - `DELETE /transactions` - Clear the pending pool
//!
//! ## Mining and consensus
//! - `GET /mine` - Mine one block
//! - `GET /mine/start` - Start the periodic miner
//! - `PUT /consensus` - Adopt the longest valid peer chain
//! - `GET /amount?blockchain_address=..` - Balance of an address
//!
//! ## Wallets
//! - `POST /wallet` - Create a wallet
//! - `POST /wallet/transaction` - Sign a transfer with a supplied key and submit it

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;
