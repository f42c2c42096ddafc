//! Display Formatting
//!
//! Pure formatting helpers for the token table and wallet panel.

use chrono::{DateTime, Local, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

const TRILLION: Decimal = dec!(1000000000000);
const BILLION: Decimal = dec!(1000000000);
const MILLION: Decimal = dec!(1000000);

/// Characters of the signature shown in the wallet panel
pub const SIGNATURE_PREVIEW_LEN: usize = 50;

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, round(value, dp))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// USD price: thousands separators, 2 decimals, 6 below one dollar
pub fn format_price(price: Decimal) -> String {
    let dp = if price < Decimal::ONE { 6 } else { 2 };
    let text = fixed(price.abs(), dp);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let sign = if price.is_sign_negative() && !round(price, dp).is_zero() { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}${}", sign, group_thousands(int_part))
    } else {
        format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
    }
}

fn compact(value: Decimal) -> Option<String> {
    if value >= TRILLION {
        Some(format!("{}T", fixed(value / TRILLION, 2)))
    } else if value >= BILLION {
        Some(format!("{}B", fixed(value / BILLION, 2)))
    } else if value >= MILLION {
        Some(format!("{}M", fixed(value / MILLION, 2)))
    } else {
        None
    }
}

/// Market cap / volume: `$1.32T`, `$2.50B`, `$3.00M`, else `$999.00`
pub fn format_usd_compact(value: Decimal) -> String {
    match compact(value) {
        Some(text) => format!("${}", text),
        None => format!("${}", fixed(value, 2)),
    }
}

/// Supply: `21.00M`, whole units below a million, `N/A` when unknown or zero
pub fn format_supply(supply: Option<Decimal>) -> String {
    match supply {
        None => "N/A".to_string(),
        Some(value) if value.is_zero() => "N/A".to_string(),
        Some(value) => compact(value).unwrap_or_else(|| fixed(value, 0)),
    }
}

/// Direction of the 24h change badge; zero counts as up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDirection {
    Up,
    Down,
}

impl ChangeDirection {
    pub fn of(change: Decimal) -> Self {
        if change >= Decimal::ZERO {
            ChangeDirection::Up
        } else {
            ChangeDirection::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            ChangeDirection::Up => "▲",
            ChangeDirection::Down => "▼",
        }
    }
}

/// 24h change badge text: `+1.23%` / `-4.56%`
pub fn format_change(change: Decimal) -> String {
    match ChangeDirection::of(change) {
        ChangeDirection::Up => format!("+{}%", fixed(change, 2)),
        ChangeDirection::Down => format!("{}%", fixed(change, 2)),
    }
}

/// "Last updated" label relative to `now`
pub fn format_last_updated(updated: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - updated).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        updated.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Leading part of a signature for display
pub fn signature_preview(signature: &str) -> String {
    let head: String = signature.chars().take(SIGNATURE_PREVIEW_LEN).collect();
    format!("{}...", head)
}
