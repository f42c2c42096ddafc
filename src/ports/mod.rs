//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Market data feed (token list)
//! - Wallet session (connect, sign, switch chain, balances)
//! - The shared, read-only wallet session context

pub mod market_data;
pub mod wallet;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod mocks;

pub use market_data::{MarketDataError, TokenFeed};
pub use wallet::{WalletError, WalletErrorKind, WalletPort};
pub use session::{SessionContext, SessionPublisher};
