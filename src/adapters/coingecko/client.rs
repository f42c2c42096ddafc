//! CoinGecko Markets Client
//!
//! Fetches the top tokens by market cap from `/coins/markets`. One request per
//! call; retrying is left to the poller's next tick.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;

use crate::config::MarketDataSection;
use crate::domain::Token;
use crate::ports::{MarketDataError, TokenFeed};

/// Configuration for the CoinGeckoClient
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// `/coins/markets` endpoint URL
    pub endpoint: String,
    pub vs_currency: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.coingecko.com/api/v3/coins/markets".to_string(),
            vs_currency: "usd".to_string(),
            per_page: 10,
            timeout: Duration::from_secs(10),
        }
    }
}

impl CoinGeckoConfig {
    /// Create config with a custom endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

impl From<&MarketDataSection> for CoinGeckoConfig {
    fn from(section: &MarketDataSection) -> Self {
        Self {
            endpoint: section.get_endpoint(),
            vs_currency: section.vs_currency.clone(),
            per_page: section.per_page,
            timeout: section.timeout(),
        }
    }
}

/// Token feed backed by the CoinGecko markets API
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

impl CoinGeckoClient {
    /// Create a new CoinGeckoClient with default configuration
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(CoinGeckoConfig::default())
    }

    /// Create a new CoinGeckoClient with custom configuration
    pub fn with_config(config: CoinGeckoConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    fn query(&self) -> [(&'static str, String); 5] {
        [
            ("vs_currency", self.config.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", self.config.per_page.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
        ]
    }
}

#[async_trait]
impl TokenFeed for CoinGeckoClient {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, MarketDataError> {
        tracing::debug!("GET {} (per_page={})", self.config.endpoint, self.config.per_page);

        let response = self.http
            .get(&self.config.endpoint)
            .query(&self.query())
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Market data request failed with status {}", status);
            return Err(MarketDataError::FetchFailed { status: status.as_u16() });
        }

        let tokens: Vec<Token> = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParseError(e.to_string()))?;

        tracing::debug!("Fetched {} tokens", tokens.len());
        Ok(tokens)
    }
}
