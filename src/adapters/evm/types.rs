//! JSON-RPC Wire Types
//!
//! Envelope types for JSON-RPC 2.0 and hex-quantity helpers used by the
//! wallet provider and chain RPC clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// EIP-1193: the user rejected the request
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-1193: the provider is disconnected from all chains
pub const PROVIDER_DISCONNECTED: i64 = 4900;
/// EIP-1193: the provider is not connected to the requested chain
pub const CHAIN_DISCONNECTED: i64 = 4901;

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Parse a `0x`-prefixed hex quantity (`eth_getBalance`, `eth_chainId`)
pub fn parse_quantity(quantity: &str) -> Option<u128> {
    let digits = quantity.strip_prefix("0x").or_else(|| quantity.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

/// Hex-encode UTF-8 text for `personal_sign`
pub fn encode_message(message: &str) -> String {
    format!("0x{}", hex::encode(message.as_bytes()))
}
