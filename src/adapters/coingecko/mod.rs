//! CoinGecko Market Data Adapter
//!
//! Implements `TokenFeed` over the public `/coins/markets` endpoint. The
//! response rows are passed through as `Token` records in upstream rank order.

mod client;

pub use client::{CoinGeckoClient, CoinGeckoConfig};
