//! EIP-1193 Provider
//!
//! A wallet reachable as a JSON-RPC endpoint. Every error leaving this module
//! is already classified into a `WalletError`.

use std::time::Duration;
use serde_json::json;

use crate::domain::{Address, ChainId, ConnectorInfo};
use crate::ports::WalletError;
use super::rpc::{JsonRpcClient, RpcError};
use super::types::{encode_message, CHAIN_DISCONNECTED, PROVIDER_DISCONNECTED, USER_REJECTED_REQUEST};

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Unreachable(msg) => WalletError::ProviderUnavailable(msg),
            RpcError::Rpc { code: USER_REJECTED_REQUEST, message } => WalletError::UserRejected(message),
            RpcError::Rpc { code: PROVIDER_DISCONNECTED | CHAIN_DISCONNECTED, message } => {
                WalletError::ProviderUnavailable(message)
            }
            RpcError::Rpc { message, .. } => WalletError::Provider(message),
            other => WalletError::Provider(other.to_string()),
        }
    }
}

/// One configured wallet connector
#[derive(Debug)]
pub struct Eip1193Provider {
    info: ConnectorInfo,
    rpc: JsonRpcClient,
}

impl Eip1193Provider {
    pub fn new(info: ConnectorInfo, url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let rpc = JsonRpcClient::new(url, timeout)?;
        Ok(Self { info, rpc })
    }

    pub fn info(&self) -> &ConnectorInfo {
        &self.info
    }

    pub fn url(&self) -> &str {
        self.rpc.url()
    }

    /// Ask the wallet for account access (may prompt the user)
    pub async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let raw: Vec<String> = self.rpc.call("eth_requestAccounts", json!([])).await?;
        parse_accounts(raw)
    }

    /// Accounts already exposed to us; empty when the wallet revoked access
    pub async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        let raw: Vec<String> = self.rpc.call("eth_accounts", json!([])).await?;
        parse_accounts(raw)
    }

    pub async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let raw: String = self.rpc.call("eth_chainId", json!([])).await?;
        ChainId::from_hex(&raw).ok_or_else(|| WalletError::Provider(format!("Invalid chain id '{}'", raw)))
    }

    pub async fn personal_sign(&self, message: &str, address: &Address) -> Result<String, WalletError> {
        let signature: String = self
            .rpc
            .call("personal_sign", json!([encode_message(message), address.as_str()]))
            .await?;
        Ok(signature)
    }

    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        let _: serde_json::Value = self
            .rpc
            .call("wallet_switchEthereumChain", json!([{ "chainId": chain_id.to_hex() }]))
            .await?;
        Ok(())
    }

    /// True when the provider answers `eth_chainId`
    pub async fn probe(&self) -> bool {
        self.chain_id().await.is_ok()
    }
}

fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, WalletError> {
    raw.iter()
        .map(|a| Address::parse(a).map_err(|e| WalletError::Provider(format!("Invalid account '{}': {}", a, e))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_server;
    use crate::ports::WalletErrorKind;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    const ADDR: &str = "0xAbCdEf0123456789aBcDeF0123456789ABCDEF01";

    async fn provider_with(handler: fn(&str, &Value) -> Value) -> Eip1193Provider {
        let router = Router::new().route(
            "/",
            post(move |Json(req): Json<Value>| async move {
                let method = req["method"].as_str().unwrap_or_default().to_string();
                let mut body = handler(&method, &req["params"]);
                body["jsonrpc"] = json!("2.0");
                body["id"] = req["id"].clone();
                Json(body)
            }),
        );
        let url = test_server::spawn(router).await;
        Eip1193Provider::new(ConnectorInfo::new("frame", "Frame"), url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_error_classification() {
        let rejected = WalletError::from(RpcError::Rpc { code: 4001, message: "User rejected the request.".into() });
        assert_eq!(rejected.kind(), WalletErrorKind::UserRejected);

        let disconnected = WalletError::from(RpcError::Rpc { code: 4900, message: "Disconnected".into() });
        assert_eq!(disconnected.kind(), WalletErrorKind::ProviderUnavailable);

        let refused = WalletError::from(RpcError::Unreachable("connection refused".into()));
        assert_eq!(refused.kind(), WalletErrorKind::ProviderUnavailable);

        let other = WalletError::from(RpcError::Rpc { code: -32603, message: "Internal JSON-RPC error.".into() });
        assert_eq!(other, WalletError::Provider("Internal JSON-RPC error.".into()));
    }

    #[tokio::test]
    async fn test_request_accounts_lowercases() {
        let provider = provider_with(|method, _| {
            assert_eq!(method, "eth_requestAccounts");
            json!({"result": [ADDR]})
        })
        .await;

        let accounts = provider.request_accounts().await.unwrap();
        assert_eq!(accounts[0].as_str(), ADDR.to_lowercase());
    }

    #[tokio::test]
    async fn test_personal_sign_sends_hex_message() {
        let provider = provider_with(|method, params| {
            assert_eq!(method, "personal_sign");
            assert_eq!(params[0], "0x6869");
            json!({"result": "0xsig"})
        })
        .await;

        let address = Address::parse(ADDR).unwrap();
        assert_eq!(provider.personal_sign("hi", &address).await.unwrap(), "0xsig");
    }

    #[tokio::test]
    async fn test_switch_chain_rejected() {
        let provider = provider_with(|method, params| {
            assert_eq!(method, "wallet_switchEthereumChain");
            assert_eq!(params[0]["chainId"], "0x38");
            json!({"error": {"code": 4001, "message": "User rejected the request."}})
        })
        .await;

        let err = provider.switch_chain(ChainId::BSC).await.unwrap_err();
        assert_eq!(err.kind(), WalletErrorKind::UserRejected);
    }

    #[tokio::test]
    async fn test_probe() {
        let provider = provider_with(|_, _| json!({"result": "0x1"})).await;
        assert!(provider.probe().await);
        assert_eq!(provider.chain_id().await.unwrap(), ChainId::ETHEREUM);

        let url = test_server::closed_port_url().await;
        let dead = Eip1193Provider::new(ConnectorInfo::new("x", "X"), url, Duration::from_secs(1)).unwrap();
        assert!(!dead.probe().await);
    }
}
