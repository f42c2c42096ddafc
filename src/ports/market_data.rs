use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Token;

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Upstream answered with a non-2xx status
    #[error("Failed to fetch token data")]
    FetchFailed { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),
}

/// Source of the token list
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenFeed: Send + Sync {
    /// Fetch the current token list in upstream (rank) order
    async fn fetch_tokens(&self) -> Result<Vec<Token>, MarketDataError>;
}
