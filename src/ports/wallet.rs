use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Address, BalanceSnapshot, ChainId, ConnectorInfo, SignFailure, WalletSession};
use super::session::SessionContext;

/// Closed set of failure reasons callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletErrorKind {
    /// No wallet provider reachable
    ProviderUnavailable,
    /// The user declined the request in the wallet
    UserRejected,
    /// Anything else
    Other,
}

/// Wallet operation error, classified once at the adapter boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("No wallet provider available: {0}")]
    ProviderUnavailable(String),

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    /// Provider message, passed through unmodified
    #[error("{0}")]
    Provider(String),

    #[error("Unknown connector: {0}")]
    UnknownConnector(String),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("No RPC endpoint configured for chain {0}")]
    UnsupportedChain(ChainId),
}

impl WalletError {
    pub fn kind(&self) -> WalletErrorKind {
        match self {
            WalletError::ProviderUnavailable(_) => WalletErrorKind::ProviderUnavailable,
            WalletError::UserRejected(_) => WalletErrorKind::UserRejected,
            WalletError::Provider(_)
            | WalletError::UnknownConnector(_)
            | WalletError::NotConnected
            | WalletError::UnsupportedChain(_) => WalletErrorKind::Other,
        }
    }

    /// Message text without the variant prefix
    pub fn message(&self) -> String {
        match self {
            WalletError::ProviderUnavailable(msg)
            | WalletError::UserRejected(msg)
            | WalletError::Provider(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<WalletError> for SignFailure {
    fn from(err: WalletError) -> Self {
        match err.kind() {
            WalletErrorKind::UserRejected => SignFailure::UserRejected,
            _ => SignFailure::Other(err.message()),
        }
    }
}

/// Wallet session adapter
///
/// The adapter is the only writer of the wallet session; callers observe it
/// through `session()` and request transitions through the async methods.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletPort: Send + Sync {
    /// Connector backends available for `connect`
    fn connectors(&self) -> Vec<ConnectorInfo>;

    /// Read-only view of the session
    fn session(&self) -> SessionContext;

    async fn connect(&self, connector_id: &str) -> Result<WalletSession, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Ask the wallet to change network; failures leave the session untouched
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;

    /// Sign `message` with the connected account, returning the hex signature
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;

    /// Native balance of `address` on `chain_id`
    async fn get_balance(&self, address: &Address, chain_id: ChainId)
        -> Result<BalanceSnapshot, WalletError>;

    /// Re-read account and network from the provider
    async fn sync(&self) -> Result<(), WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            WalletError::ProviderUnavailable("refused".into()).kind(),
            WalletErrorKind::ProviderUnavailable
        );
        assert_eq!(WalletError::UserRejected("no".into()).kind(), WalletErrorKind::UserRejected);
        assert_eq!(WalletError::Provider("boom".into()).kind(), WalletErrorKind::Other);
        assert_eq!(WalletError::NotConnected.kind(), WalletErrorKind::Other);
    }

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = WalletError::Provider("execution reverted: nope".into());
        assert_eq!(err.to_string(), "execution reverted: nope");
        assert_eq!(err.message(), "execution reverted: nope");
    }

    #[test]
    fn test_into_sign_failure() {
        assert_eq!(
            SignFailure::from(WalletError::UserRejected("User denied message signature.".into())),
            SignFailure::UserRejected
        );
        assert_eq!(
            SignFailure::from(WalletError::Provider("ledger locked".into())),
            SignFailure::Other("ledger locked".into())
        );
    }
}
