//! Native Balance Snapshot

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::chain::ChainId;

/// Native-token balance of one address on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Amount in the smallest unit (wei)
    pub value: u128,
    pub decimals: u8,
    pub symbol: String,
    pub chain_id: ChainId,
}

impl BalanceSnapshot {
    pub fn new(value: u128, decimals: u8, symbol: impl Into<String>, chain_id: ChainId) -> Self {
        Self { value, decimals, symbol: symbol.into(), chain_id }
    }

    /// Whole-unit amount, `None` if it does not fit a Decimal
    pub fn amount(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.value).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, u32::from(self.decimals)).ok()
    }

    /// Display form with four decimals: `1.2346 BNB`
    pub fn formatted(&self) -> String {
        match self.amount() {
            Some(amount) => {
                let rounded = amount.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
                format!("{:.4} {}", rounded, self.symbol)
            }
            None => {
                let amount = self.value as f64 / 10f64.powi(i32::from(self.decimals));
                format!("{:.4} {}", amount, self.symbol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_balance() {
        let balance = BalanceSnapshot::new(1_234_567_890_000_000_000, 18, "BNB", ChainId::BSC);
        assert_eq!(balance.formatted(), "1.2346 BNB");
    }

    #[test]
    fn test_zero_balance() {
        let balance = BalanceSnapshot::new(0, 18, "BNB", ChainId::BSC);
        assert_eq!(balance.formatted(), "0.0000 BNB");
    }

    #[test]
    fn test_huge_balance_falls_back() {
        let balance = BalanceSnapshot::new(u128::MAX, 18, "ETH", ChainId::ETHEREUM);
        assert!(balance.amount().is_none());
        assert!(balance.formatted().ends_with(" ETH"));
    }
}
