//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    ChainSection, Config, ConfigError, ConnectorSection, LoggingSection, MarketDataSection,
    PollingSection, WalletSection, load_config,
};
