//! JSON-RPC Transport
//!
//! Thin HTTP JSON-RPC 2.0 client shared by wallet providers and chain
//! endpoints. Transport failures and JSON-RPC error objects are kept apart so
//! callers can classify them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::types::{parse_quantity, RpcErrorObject, RpcRequest, RpcResponse};

/// Errors from a single JSON-RPC call
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RpcError {
    /// Nothing accepted the connection
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Http(u16),

    /// JSON-RPC error object returned by the endpoint
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl From<RpcErrorObject> for RpcError {
    fn from(obj: RpcErrorObject) -> Self {
        RpcError::Rpc { code: obj.code, message: obj.message }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::Timeout
        } else if err.is_connect() {
            RpcError::Unreachable(err.to_string())
        } else {
            RpcError::ParseError(err.to_string())
        }
    }
}

/// JSON-RPC client bound to one URL
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    http: Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::ParseError(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and deserialize its `result`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("rpc {} -> {} (id={})", method, self.url, id);

        let response = self.http
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Some providers send error objects with a non-2xx status
        let parsed: Result<RpcResponse, _> = serde_json::from_str(&body);
        match parsed {
            Ok(RpcResponse { error: Some(err), .. }) => {
                tracing::debug!("rpc {} failed: {} ({})", method, err.message, err.code);
                Err(err.into())
            }
            _ if !status.is_success() => Err(RpcError::Http(status.as_u16())),
            Ok(RpcResponse { result, .. }) => {
                serde_json::from_value(result.unwrap_or(Value::Null))
                    .map_err(|e| RpcError::ParseError(format!("{}: {}", method, e)))
            }
            Err(e) => Err(RpcError::ParseError(e.to_string())),
        }
    }

    /// `eth_getBalance` at the latest block, in the chain's smallest unit
    pub async fn get_balance(&self, address: &str) -> Result<u128, RpcError> {
        let quantity: String = self
            .call("eth_getBalance", serde_json::json!([address, "latest"]))
            .await?;
        parse_quantity(&quantity)
            .ok_or_else(|| RpcError::ParseError(format!("invalid quantity '{}'", quantity)))
    }
}
