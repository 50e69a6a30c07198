//! Outbound calls to peer nodes
//!
//! Peers talk plain HTTP/1.1 with JSON bodies. The client opens one
//! connection per call (`Connection: close`) and bounds each call with a
//! timeout; nothing is retried.

use crate::core::{Block, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default bound on a single peer call
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Peer communication errors
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Request to {0} timed out")]
    Timeout(String),
    #[error("Invalid peer URL: {0}")]
    InvalidUrl(String),
    #[error("Peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },
    #[error("Invalid HTTP response: {0}")]
    InvalidResponse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Body of `GET /chain`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub blocks: Vec<Block>,
}

/// Calls a node makes on its peers
pub trait PeerClient: Send + Sync + 'static {
    /// Download a peer's exported chain
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>, PeerError>> + Send;

    /// Relay an admitted transaction
    fn broadcast_transaction(
        &self,
        peer: &str,
        request: &TransactionRequest,
    ) -> impl Future<Output = Result<(), PeerError>> + Send;

    /// Ask a peer to drop its pending pool
    fn notify_pool_cleared(&self, peer: &str) -> impl Future<Output = Result<(), PeerError>> + Send;

    /// Ask a peer to run conflict resolution after a local block was mined
    fn notify_block_mined(&self, peer: &str) -> impl Future<Output = Result<(), PeerError>> + Send;
}

/// [`PeerClient`] over HTTP/1.1 on a raw TCP stream
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    timeout: Duration,
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_TIMEOUT)
    }
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Send one request and return the response body on a 2xx status
    async fn request(
        &self,
        method: &str,
        peer: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, PeerError> {
        match tokio::time::timeout(self.timeout, send_request(method, peer, path, body)).await {
            Ok(result) => result,
            Err(_) => Err(PeerError::Timeout(format!("{}{}", peer, path))),
        }
    }
}

impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, PeerError> {
        let body = self.request("GET", peer, "/chain", None).await?;
        let response: ChainResponse = serde_json::from_slice(&body)?;
        Ok(response.blocks)
    }

    async fn broadcast_transaction(
        &self,
        peer: &str,
        request: &TransactionRequest,
    ) -> Result<(), PeerError> {
        let body = serde_json::to_vec(request)?;
        self.request("PUT", peer, "/transactions", Some(body)).await?;
        Ok(())
    }

    async fn notify_pool_cleared(&self, peer: &str) -> Result<(), PeerError> {
        self.request("DELETE", peer, "/transactions", None).await?;
        Ok(())
    }

    async fn notify_block_mined(&self, peer: &str) -> Result<(), PeerError> {
        self.request("PUT", peer, "/consensus", None).await?;
        Ok(())
    }
}

/// Split `http://host:port` into the socket address and `Host` header value
fn parse_peer_url(peer: &str) -> Result<(String, String), PeerError> {
    let rest = peer
        .strip_prefix("http://")
        .ok_or_else(|| PeerError::InvalidUrl(peer.to_string()))?;
    let host = rest.split('/').next().unwrap_or_default();

    if host.is_empty() {
        return Err(PeerError::InvalidUrl(peer.to_string()));
    }

    let addr = if host.contains(':') {
        host.to_string()
    } else {
        format!("{}:80", host)
    };
    Ok((addr, host.to_string()))
}

async fn send_request(
    method: &str,
    peer: &str,
    path: &str,
    body: Option<Vec<u8>>,
) -> Result<Vec<u8>, PeerError> {
    let (addr, host) = parse_peer_url(peer)?;
    let mut stream = TcpStream::connect(&addr).await?;

    let body = body.unwrap_or_default();
    let mut request = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nContent-Length: {}\r\n",
        method,
        path,
        host,
        body.len()
    );
    if !body.is_empty() {
        request.push_str("Content-Type: application/json\r\n");
    }
    request.push_str("\r\n");

    let mut payload = request.into_bytes();
    payload.extend_from_slice(&body);
    stream.write_all(&payload).await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;

    let (status, body) = parse_response(&response)?;
    if !(200..300).contains(&status) {
        return Err(PeerError::Status {
            peer: peer.to_string(),
            status,
        });
    }
    Ok(body)
}

/// Split a complete HTTP/1.1 response into status code and body
fn parse_response(response: &[u8]) -> Result<(u16, Vec<u8>), PeerError> {
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| PeerError::InvalidResponse("missing header terminator".to_string()))?;

    let head = std::str::from_utf8(&response[..split])
        .map_err(|_| PeerError::InvalidResponse("non-UTF-8 headers".to_string()))?;
    let body = &response[split + 4..];

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| PeerError::InvalidResponse("bad status line".to_string()))?;

    let chunked = lines.any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("transfer-encoding:") && line.contains("chunked")
    });

    let body = if chunked {
        decode_chunked(body)?
    } else {
        body.to_vec()
    };
    Ok((status, body))
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>, PeerError> {
    let mut body = Vec::new();
    loop {
        let line_end = data
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| PeerError::InvalidResponse("truncated chunk".to_string()))?;
        let size_line = std::str::from_utf8(&data[..line_end])
            .map_err(|_| PeerError::InvalidResponse("bad chunk size".to_string()))?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| PeerError::InvalidResponse("bad chunk size".to_string()))?;

        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(body);
        }
        if data.len() < size + 2 {
            return Err(PeerError::InvalidResponse("truncated chunk".to_string()));
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Serve one canned response and hand back the raw request
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .find_map(|line| line.strip_prefix("Content-Length: "))
            .and_then(|n| n.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= split + 4 + length
    }

    #[test]
    fn test_parse_peer_url() {
        let (addr, host) = parse_peer_url("http://127.0.0.1:5001").unwrap();
        assert_eq!(addr, "127.0.0.1:5001");
        assert_eq!(host, "127.0.0.1:5001");

        let (addr, _) = parse_peer_url("http://node").unwrap();
        assert_eq!(addr, "node:80");

        assert!(parse_peer_url("https://node").is_err());
        assert!(parse_peer_url("http://").is_err());
    }

    #[test]
    fn test_parse_response() {
        let raw = b"HTTP/1.1 201 Created\r\ncontent-length: 2\r\n\r\n{}";
        let (status, body) = parse_response(raw).unwrap();
        assert_eq!(status, 201);
        assert_eq!(body, b"{}");

        assert!(parse_response(b"garbage").is_err());
    }

    #[test]
    fn test_parse_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let (status, body) = parse_response(raw).unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, b"Wikipedia");
    }

    #[tokio::test]
    async fn test_fetch_chain() {
        let (peer, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 139\r\n\r\n\
             {\"blocks\":[{\"timestamp\":0,\"nonce\":0,\"previous_hash\":\"0000000000000000000000000000000000000000000000000000000000000000\",\"transactions\":[]}]}",
        )
        .await;

        let client = HttpPeerClient::default();
        let blocks = client.fetch_chain(&peer).await.unwrap();
        assert_eq!(blocks, vec![Block::genesis()]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /chain HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_broadcast_transaction_sends_json() {
        let (peer, server) = serve_once("HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n").await;

        let request = TransactionRequest {
            sender_blockchain_address: Some("A".into()),
            recipient_blockchain_address: Some("B".into()),
            sender_public_key: Some("00".into()),
            signature: Some("00".into()),
            value: Some(1.0),
        };
        HttpPeerClient::default()
            .broadcast_transaction(&peer, &request)
            .await
            .unwrap();

        let raw = server.await.unwrap();
        assert!(raw.starts_with("PUT /transactions HTTP/1.1\r\n"));
        assert!(raw.contains("\"sender_blockchain_address\":\"A\""));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (peer, _server) = serve_once("HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\n\r\n").await;

        let result = HttpPeerClient::default().notify_pool_cleared(&peer).await;
        assert!(matches!(result, Err(PeerError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_unreachable_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = HttpPeerClient::default()
            .notify_block_mined(&format!("http://{}", addr))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = HttpPeerClient::new(Duration::from_millis(100));
        let result = client.fetch_chain(&format!("http://{}", addr)).await;
        assert!(matches!(result, Err(PeerError::Timeout(_))));
    }
}
