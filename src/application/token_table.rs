//! Token Table View
//!
//! Shapes a `TokenSnapshot` into display rows and decides what the buy
//! action does for the current wallet session.

use chrono::{DateTime, Utc};

use crate::domain::{
    format_change, format_last_updated, format_price, format_supply, format_usd_compact,
    ChangeDirection, Token, WalletSession,
};
use super::polling::TokenSnapshot;

pub const TABLE_TITLE: &str = "Top 10 Trending Tokens";
pub const LOADING_MESSAGE: &str = "Loading token data...";
pub const UPDATING_LABEL: &str = "Updating...";
pub const CONNECT_FIRST_MESSAGE: &str = "Please connect your wallet first";

/// One formatted table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    pub id: String,
    pub rank: String,
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub direction: ChangeDirection,
    pub market_cap: String,
    pub volume: String,
    pub supply: String,
}

impl From<&Token> for TokenRow {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            rank: token.market_cap_rank.to_string(),
            symbol: token.display_symbol(),
            name: token.name.clone(),
            price: format_price(token.current_price),
            change: format_change(token.change_24h()),
            direction: ChangeDirection::of(token.change_24h()),
            market_cap: format_usd_compact(token.market_cap),
            volume: format_usd_compact(token.total_volume),
            supply: format_supply(token.total_supply),
        }
    }
}

/// What the table area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// First fetch outstanding
    Loading,
    /// No data at all and the last fetch failed
    Error(String),
    /// Rows available (possibly with an error banner)
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTableView {
    pub status: TableStatus,
    pub rows: Vec<TokenRow>,
    /// Error of a failed refetch while older rows are still shown
    pub banner: Option<String>,
    pub last_updated: Option<String>,
    pub is_refreshing: bool,
}

impl TokenTableView {
    pub fn build(snapshot: &TokenSnapshot, now: DateTime<Utc>) -> Self {
        let status = if snapshot.has_data() {
            TableStatus::Ready
        } else if let Some(error) = &snapshot.error {
            TableStatus::Error(error.clone())
        } else {
            TableStatus::Loading
        };

        let banner = match status {
            TableStatus::Ready => snapshot.error.clone(),
            _ => None,
        };

        Self {
            status,
            rows: snapshot.tokens.iter().map(TokenRow::from).collect(),
            banner,
            last_updated: snapshot.updated_at.map(|at| format_last_updated(at, now)),
            is_refreshing: snapshot.is_refreshing,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.status {
            TableStatus::Loading => Some(LOADING_MESSAGE.to_string()),
            TableStatus::Error(error) => Some(format!("Error: {}", error)),
            TableStatus::Ready => None,
        }
    }
}

/// "Auto-refreshes every 60s"
pub fn auto_refresh_note(interval_secs: u64) -> String {
    format!("Auto-refreshes every {}s", interval_secs)
}

pub fn refresh_button_label(is_refreshing: bool) -> &'static str {
    if is_refreshing {
        "Refreshing..."
    } else {
        "Refresh Now"
    }
}

/// Label of the per-row action button
pub fn buy_button_label(session: &WalletSession) -> &'static str {
    if session.is_connecting() {
        "Connecting..."
    } else if session.is_connected() {
        "Buy Token"
    } else {
        "Connect Wallet"
    }
}

/// Result of pressing buy on a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyOutcome {
    /// Button is inert while a connection is pending
    Ignored,
    ConnectFirst,
    /// Placeholder notice; no trade is executed
    Placeholder(String),
}

impl BuyOutcome {
    pub fn message(&self) -> Option<String> {
        match self {
            BuyOutcome::Ignored => None,
            BuyOutcome::ConnectFirst => Some(CONNECT_FIRST_MESSAGE.to_string()),
            BuyOutcome::Placeholder(text) => Some(text.clone()),
        }
    }
}

pub fn buy(symbol: &str, session: &WalletSession) -> BuyOutcome {
    if session.is_connecting() {
        BuyOutcome::Ignored
    } else if !session.is_connected() {
        BuyOutcome::ConnectFirst
    } else {
        BuyOutcome::Placeholder(format!(
            "Buy {} - This would integrate with a DEX or swap protocol",
            symbol
        ))
    }
}
