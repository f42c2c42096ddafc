//! Chain Identifiers
//!
//! Numeric EVM chain ids and the handful of networks the dashboard names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of an EVM network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const SEPOLIA: ChainId = ChainId(11_155_111);
    pub const BSC: ChainId = ChainId(56);

    /// Parse the `0x`-prefixed hex quantity returned by `eth_chainId`
    pub fn from_hex(quantity: &str) -> Option<Self> {
        let digits = quantity.strip_prefix("0x").or_else(|| quantity.strip_prefix("0X"))?;
        u64::from_str_radix(digits, 16).ok().map(ChainId)
    }

    /// Hex quantity form used by `wallet_switchEthereumChain`
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Human-readable network label
    pub fn label(&self) -> String {
        match KnownChain::from_id(*self) {
            Some(chain) => chain.name().to_string(),
            None => format!("Chain ID: {}", self.0),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

/// Networks recognised by name in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownChain {
    Ethereum,
    Sepolia,
    Bsc,
}

impl KnownChain {
    pub fn from_id(id: ChainId) -> Option<Self> {
        match id {
            ChainId::ETHEREUM => Some(KnownChain::Ethereum),
            ChainId::SEPOLIA => Some(KnownChain::Sepolia),
            ChainId::BSC => Some(KnownChain::Bsc),
            _ => None,
        }
    }

    pub fn id(&self) -> ChainId {
        match self {
            KnownChain::Ethereum => ChainId::ETHEREUM,
            KnownChain::Sepolia => ChainId::SEPOLIA,
            KnownChain::Bsc => ChainId::BSC,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KnownChain::Ethereum => "Ethereum Mainnet",
            KnownChain::Sepolia => "Sepolia Testnet",
            KnownChain::Bsc => "BSC Mainnet",
        }
    }

    /// Short name used on the switch button ("Switch to BSC")
    pub fn short_name(&self) -> &'static str {
        match self {
            KnownChain::Ethereum => "Ethereum",
            KnownChain::Sepolia => "Sepolia",
            KnownChain::Bsc => "BSC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(ChainId(56).label(), "BSC Mainnet");
        assert_eq!(ChainId(1).label(), "Ethereum Mainnet");
        assert_eq!(ChainId(11155111).label(), "Sepolia Testnet");
    }

    #[test]
    fn test_unknown_label_is_numeric() {
        assert_eq!(ChainId(137).label(), "Chain ID: 137");
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(ChainId::from_hex("0x38"), Some(ChainId::BSC));
        assert_eq!(ChainId::from_hex("0xaa36a7"), Some(ChainId::SEPOLIA));
        assert_eq!(ChainId::BSC.to_hex(), "0x38");
        assert_eq!(ChainId::from_hex("56"), None);
        assert_eq!(ChainId::from_hex("0xzz"), None);
    }
}
