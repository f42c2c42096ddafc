//! Token Records
//!
//! Market snapshot of a single token as delivered by the market-data source.
//! Records are immutable once received; a fetch replaces the whole list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the upstream `/coins/markets` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Upstream identifier (e.g. "bitcoin")
    pub id: String,
    /// Ticker symbol, lowercase upstream (e.g. "btc")
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Current price in USD
    pub current_price: Decimal,
    /// Market capitalization in USD
    pub market_cap: Decimal,
    /// Rank by market cap, positive and unique within one fetch
    pub market_cap_rank: u32,
    /// 24h price change in percent; upstream sends null for fresh listings
    #[serde(default)]
    pub price_change_percentage_24h: Option<Decimal>,
    /// 24h trading volume in USD
    pub total_volume: Decimal,
    /// Total supply, null when unknown
    #[serde(default)]
    pub total_supply: Option<Decimal>,
    /// Icon URL
    pub image: String,
}

impl Token {
    /// 24h change with null treated as flat
    pub fn change_24h(&self) -> Decimal {
        self.price_change_percentage_24h.unwrap_or(Decimal::ZERO)
    }

    /// True when the 24h change is zero or positive
    pub fn is_positive(&self) -> bool {
        self.change_24h() >= Decimal::ZERO
    }

    /// Symbol as displayed in the table
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }
}
