//! Tokenboard - Token Dashboard Library
//!
//! Top tokens by market cap with background refresh, plus an EVM wallet
//! panel: connect, verify by signature, switch network, read balance.
//!
//! # Modules
//!
//! - `domain`: Core types (Token, WalletSession, VerificationMachine, formatting)
//! - `ports`: Trait abstractions (TokenFeed, WalletPort) and the session context
//! - `adapters`: External implementations (CoinGecko, EVM provider, TUI, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Token polling, wallet widget and table view

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
