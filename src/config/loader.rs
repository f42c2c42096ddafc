//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/dashboard.toml structure.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::ChainId;

/// Main configuration structure matching config/dashboard.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub market_data: MarketDataSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub wallet: WalletSection,
    #[serde(default = "default_chains")]
    pub chains: Vec<ChainSection>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Market data API section
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataSection {
    /// CoinGecko `/coins/markets` endpoint, without query string
    #[serde(default = "default_market_endpoint")]
    pub endpoint: String,
    /// Quote currency
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    /// Number of tokens requested (top N by market cap)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MarketDataSection {
    /// Get endpoint with environment variable override
    /// Checks TOKENBOARD_MARKET_DATA_URL env var first, falls back to config value
    pub fn get_endpoint(&self) -> String {
        std::env::var("TOKENBOARD_MARKET_DATA_URL").unwrap_or_else(|_| self.endpoint.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MarketDataSection {
    fn default() -> Self {
        Self {
            endpoint: default_market_endpoint(),
            vs_currency: default_vs_currency(),
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Token list refresh policy
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSection {
    /// Data counts as fresh for this long after a fetch
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Unconditional refetch period
    #[serde(default = "default_refetch_interval_secs")]
    pub refetch_interval_secs: u64,
    /// Refetch stale data when the terminal regains focus
    #[serde(default = "default_true")]
    pub refetch_on_focus: bool,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            refetch_interval_secs: default_refetch_interval_secs(),
            refetch_on_focus: true,
        }
    }
}

/// Wallet section
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSection {
    /// Chain used for balances and the "switch network" offer
    #[serde(default = "default_target_chain_id")]
    pub target_chain_id: u64,
    /// Timeout for provider requests; signing waits on the user, keep it generous
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How often the dashboard re-reads accounts/chain from the provider
    #[serde(default = "default_session_poll_secs")]
    pub session_poll_secs: u64,
    #[serde(default = "default_connectors")]
    pub connectors: Vec<ConnectorSection>,
}

impl WalletSection {
    pub fn target_chain(&self) -> ChainId {
        ChainId(self.target_chain_id)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_poll(&self) -> Duration {
        Duration::from_secs(self.session_poll_secs)
    }

    /// Connectors with TOKENBOARD_PROVIDER_URL applied to the first entry
    pub fn resolved_connectors(&self) -> Vec<ConnectorSection> {
        let mut connectors = self.connectors.clone();
        if let (Ok(url), Some(first)) = (std::env::var("TOKENBOARD_PROVIDER_URL"), connectors.first_mut()) {
            first.provider_url = url;
        }
        connectors
    }
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            target_chain_id: default_target_chain_id(),
            request_timeout_secs: default_request_timeout_secs(),
            session_poll_secs: default_session_poll_secs(),
            connectors: default_connectors(),
        }
    }
}

/// One EIP-1193 provider endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectorSection {
    pub id: String,
    pub name: String,
    pub provider_url: String,
}

/// Per-chain RPC endpoint used for balances
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChainSection {
    pub chain_id: u64,
    pub rpc_url: String,
    pub native_symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file used while the dashboard owns the terminal
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl LoggingSection {
    /// Log file path with `~` and env vars expanded
    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).into_owned())
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

fn default_market_endpoint() -> String {
    "https://api.coingecko.com/api/v3/coins/markets".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_per_page() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_stale_after_secs() -> u64 {
    30
}

fn default_refetch_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_target_chain_id() -> u64 {
    ChainId::BSC.0
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_session_poll_secs() -> u64 {
    5
}

fn default_connectors() -> Vec<ConnectorSection> {
    vec![ConnectorSection {
        id: "injected".to_string(),
        name: "Browser Wallet".to_string(),
        provider_url: "http://127.0.0.1:1248".to_string(),
    }]
}

fn default_chains() -> Vec<ChainSection> {
    vec![
        ChainSection {
            chain_id: ChainId::BSC.0,
            rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            native_symbol: "BNB".to_string(),
            decimals: 18,
        },
        ChainSection {
            chain_id: ChainId::ETHEREUM.0,
            rpc_url: "https://eth.llamarpc.com".to_string(),
            native_symbol: "ETH".to_string(),
            decimals: 18,
        },
    ]
}

fn default_decimals() -> u8 {
    18
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_file() -> String {
    "logs/tokenboard.log".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Market data
        if self.market_data.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data.endpoint cannot be empty".to_string(),
            ));
        }

        if self.market_data.per_page == 0 || self.market_data.per_page > 250 {
            return Err(ConfigError::ValidationError(format!(
                "per_page must be 1-250, got {}",
                self.market_data.per_page
            )));
        }

        if self.market_data.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "market_data.timeout_secs must be > 0".to_string(),
            ));
        }

        // Polling
        if self.polling.refetch_interval_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "refetch_interval_secs must be > 0, got {}",
                self.polling.refetch_interval_secs
            )));
        }

        // Wallet
        if self.wallet.connectors.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[wallet.connectors]] entry is required".to_string(),
            ));
        }

        for (i, connector) in self.wallet.connectors.iter().enumerate() {
            if connector.id.is_empty() || connector.provider_url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "connector #{} needs an id and a provider_url",
                    i
                )));
            }
            if self.wallet.connectors[..i].iter().any(|c| c.id == connector.id) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate connector id '{}'",
                    connector.id
                )));
            }
        }

        if self.wallet.session_poll_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session_poll_secs must be > 0".to_string(),
            ));
        }

        // Chains
        for chain in &self.chains {
            if chain.rpc_url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "rpc_url cannot be empty for chain {}",
                    chain.chain_id
                )));
            }
        }

        if self.chain(self.wallet.target_chain()).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "no [[chains]] entry for target chain {}",
                self.wallet.target_chain_id
            )));
        }

        Ok(())
    }

    /// RPC settings for a chain, if configured
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainSection> {
        self.chains.iter().find(|c| c.chain_id == chain_id.0)
    }
}
