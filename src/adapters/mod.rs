//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - CoinGecko: market data API client
//! - EVM: EIP-1193 wallet provider and JSON-RPC balance reads
//! - TUI: terminal dashboard
//! - CLI: Command-line interface handlers

pub mod coingecko;
pub mod evm;
pub mod tui;
pub mod cli;

#[cfg(test)]
pub(crate) mod test_server;

pub use coingecko::CoinGeckoClient;
pub use evm::{EvmWalletAdapter, EvmWalletConfig};
pub use cli::CliApp;
