//! REST API handlers for node operations

use crate::core::{Transaction, TransactionRequest};
use crate::network::client::ChainResponse;
use crate::network::{Node, NodeStatus};
use crate::wallet::{Wallet, WalletKeys};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub node: Arc<Node>,
}

impl ApiState {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn success() -> Json<Self> {
        Json(Self {
            message: "success".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PoolResponse {
    pub transactions: Vec<Transaction>,
    pub length: usize,
}

#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub amount: f32,
}

#[derive(Debug, Serialize)]
pub struct ConsensusResponse {
    pub replaced: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn bad_request(error: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AmountQuery {
    pub blockchain_address: String,
}

/// Transfer signed on the node with a key the client supplies
#[derive(Debug, Deserialize)]
pub struct WalletTransactionRequest {
    pub sender_private_key: String,
    pub recipient_blockchain_address: String,
    pub value: f32,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /status - Node status
pub async fn get_status(State(state): State<ApiState>) -> Json<NodeStatus> {
    Json(state.node.status().await)
}

/// GET /chain - Export the whole chain
pub async fn get_chain(State(state): State<ApiState>) -> Json<ChainResponse> {
    Json(ChainResponse {
        blocks: state.node.export_chain().await,
    })
}

/// GET /transactions - List pending transactions
pub async fn get_transactions(State(state): State<ApiState>) -> Json<PoolResponse> {
    let transactions = state.node.pending_transactions().await;
    Json(PoolResponse {
        length: transactions.len(),
        transactions,
    })
}

/// POST /transactions - Admit a client transaction and relay it to peers
pub async fn create_transaction(
    State(state): State<ApiState>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    match state.node.create_transaction(req).await {
        Ok(()) => Ok((StatusCode::CREATED, MessageResponse::success())),
        Err(e) => {
            log::warn!("Transaction rejected: {}", e);
            Err(bad_request(e))
        }
    }
}

/// PUT /transactions - Admit a transaction relayed by a peer
pub async fn relay_transaction(
    State(state): State<ApiState>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    match state.node.relay_transaction(&req).await {
        Ok(()) => Ok(MessageResponse::success()),
        Err(e) => {
            log::warn!("Relayed transaction rejected: {}", e);
            Err(bad_request(e))
        }
    }
}

/// DELETE /transactions - Drop the pending pool
pub async fn clear_transactions(State(state): State<ApiState>) -> Json<MessageResponse> {
    state.node.clear_pool().await;
    MessageResponse::success()
}

/// GET /mine - Mine one block
pub async fn mine(State(state): State<ApiState>) -> ApiResult<Json<MessageResponse>> {
    if state.node.mine().await {
        Ok(MessageResponse::success())
    } else {
        Err(bad_request("nothing mined"))
    }
}

/// GET /mine/start - Start the periodic miner
pub async fn start_mining(State(state): State<ApiState>) -> Json<MessageResponse> {
    if state.node.start_mining().is_none() {
        log::debug!("Periodic miner already running");
    }
    MessageResponse::success()
}

/// GET /amount - Balance of an address
pub async fn get_amount(
    State(state): State<ApiState>,
    Query(query): Query<AmountQuery>,
) -> Json<AmountResponse> {
    Json(AmountResponse {
        amount: state.node.balance(&query.blockchain_address).await,
    })
}

/// PUT /consensus - Resolve conflicts against peers
pub async fn consensus(State(state): State<ApiState>) -> Json<ConsensusResponse> {
    Json(ConsensusResponse {
        replaced: state.node.resolve_conflicts().await,
    })
}

/// POST /wallet - Create a wallet
pub async fn create_wallet() -> Json<WalletKeys> {
    let wallet = Wallet::new();
    log::info!("Created wallet {}", wallet.address());
    Json(wallet.export_keys())
}

/// POST /wallet/transaction - Sign a transfer and submit it
pub async fn create_wallet_transaction(
    State(state): State<ApiState>,
    Json(req): Json<WalletTransactionRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let wallet = Wallet::from_private_key(&req.sender_private_key).map_err(bad_request)?;
    let request = wallet
        .transaction_request(&req.recipient_blockchain_address, req.value)
        .map_err(bad_request)?;

    create_transaction(State(state), Json(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChainConfig;
    use crate::network::NodeConfig;

    fn state() -> ApiState {
        let config = NodeConfig {
            chain: ChainConfig {
                difficulty: 2,
                ..ChainConfig::default()
            },
            ..NodeConfig::default()
        };
        ApiState::new(Arc::new(Node::new(config, "miner")))
    }

    #[tokio::test]
    async fn test_get_chain_starts_at_genesis() {
        let Json(chain) = get_chain(State(state())).await;
        assert_eq!(chain.blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_lifecycle() {
        let state = state();
        let wallet = Wallet::new();
        let request = wallet.transaction_request("bob", 4.0).unwrap();

        let (status, _) = create_transaction(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(pool) = get_transactions(State(state.clone())).await;
        assert_eq!(pool.length, 1);
        assert_eq!(pool.transactions[0].recipient(), "bob");

        assert!(mine(State(state.clone())).await.is_ok());

        let Json(pool) = get_transactions(State(state.clone())).await;
        assert_eq!(pool.length, 0);

        let Json(amount) = get_amount(
            State(state.clone()),
            Query(AmountQuery {
                blockchain_address: "bob".into(),
            }),
        )
        .await;
        assert_eq!(amount.amount, 4.0);

        let Json(chain) = get_chain(State(state)).await;
        assert_eq!(chain.blocks.len(), 2);
    }

    #[tokio::test]
    async fn test_incomplete_request_is_bad_request() {
        let request = TransactionRequest {
            sender_blockchain_address: Some("A".into()),
            ..TransactionRequest::default()
        };

        let (status, _) = create_transaction(State(state()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forged_relay_rejected() {
        let state = state();
        let mut request = Wallet::new().transaction_request("bob", 1.0).unwrap();
        request.recipient_blockchain_address = Some("mallory".into());

        let (status, _) = relay_transaction(State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Json(pool) = get_transactions(State(state)).await;
        assert_eq!(pool.length, 0);
    }

    #[tokio::test]
    async fn test_mine_empty_pool_is_bad_request() {
        let (status, _) = mine(State(state())).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clear_transactions() {
        let state = state();
        let request = Wallet::new().transaction_request("bob", 1.0).unwrap();
        relay_transaction(State(state.clone()), Json(request))
            .await
            .unwrap();

        clear_transactions(State(state.clone())).await;
        let Json(pool) = get_transactions(State(state)).await;
        assert_eq!(pool.length, 0);
    }

    #[tokio::test]
    async fn test_consensus_without_peers() {
        let Json(response) = consensus(State(state())).await;
        assert!(!response.replaced);
    }

    #[tokio::test]
    async fn test_wallet_transaction() {
        let state = state();
        let Json(keys) = create_wallet().await;

        let req = WalletTransactionRequest {
            sender_private_key: keys.private_key.clone(),
            recipient_blockchain_address: "bob".into(),
            value: 2.0,
        };
        let (status, _) = create_wallet_transaction(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(pool) = get_transactions(State(state)).await;
        assert_eq!(pool.transactions[0].sender(), keys.address);
    }

    #[tokio::test]
    async fn test_wallet_transaction_bad_key() {
        let req = WalletTransactionRequest {
            sender_private_key: "zz".into(),
            recipient_blockchain_address: "bob".into(),
            value: 2.0,
        };
        let (status, _) = create_wallet_transaction(State(state()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status() {
        let state = state();
        let Json(status) = get_status(State(state.clone())).await;
        assert_eq!(status.chain.height, 0);
        assert_eq!(status.mempool.count, 0);
        assert!(!status.mining);

        start_mining(State(state.clone())).await;
        let Json(status) = get_status(State(state.clone())).await;
        assert!(status.mining);
        state.node.shutdown();
    }
}
