//! JSON-RPC height source.
//!
//! Queries `eth_blockNumber` over HTTP. Nodes differ in how they encode the
//! result: some return a plain JSON number, others a `0x`-prefixed hex string.
//! Both are accepted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConnectivityError, ConnectivityResult};
use crate::network::HeightSource;
use crate::types::Endpoint;

const BLOCK_NUMBER_METHOD: &str = "eth_blockNumber";

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Height source backed by a node's JSON-RPC HTTP endpoint.
#[derive(Debug)]
pub struct JsonRpcHeightSource {
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcHeightSource {
    /// Create a source whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> ConnectivityResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl HeightSource for JsonRpcHeightSource {
    async fn height(&self, endpoint: &Endpoint) -> ConnectivityResult<u64> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: BLOCK_NUMBER_METHOD,
            params: serde_json::json!([]),
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self.client.post(endpoint.as_str()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectivityError::Status(status.as_u16()));
        }

        let body = response.json::<JsonRpcResponse>().await?;

        if let Some(error) = body.error {
            return Err(ConnectivityError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = body
            .result
            .ok_or_else(|| ConnectivityError::MalformedResponse("no result".to_string()))?;
        let height = parse_height(&result)?;

        tracing::trace!("{} reported height {}", endpoint, height);
        Ok(height)
    }
}

/// Decode a block number returned as a JSON number, a hex string or a decimal string.
pub fn parse_height(value: &Value) -> ConnectivityResult<u64> {
    match value {
        Value::Number(number) => number.as_u64().ok_or_else(|| {
            ConnectivityError::MalformedResponse(format!("height {} is not a u64", number))
        }),
        Value::String(text) => {
            let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => text.parse::<u64>(),
            };
            parsed.map_err(|e| {
                ConnectivityError::MalformedResponse(format!("invalid height '{}': {}", text, e))
            })
        }
        other => Err(ConnectivityError::MalformedResponse(format!(
            "unexpected height value {}",
            other
        ))),
    }
}
