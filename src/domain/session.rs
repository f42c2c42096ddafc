//! Wallet Session
//!
//! The connection state owned by the wallet adapter. Application code only
//! reads it (see `ports::session`) and asks the adapter for transitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::chain::ChainId;

#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("Address must be 20 bytes, got {0} hex characters")]
    InvalidLength(usize),
    #[error("Address is not valid hex: {0}")]
    InvalidHex(String),
}

/// EVM account address, always stored lowercase with the `0x` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(raw.to_string()))?;

        if digits.len() != 40 {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Button form: first 6 and last 4 characters (`0x1234...abcd`)
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// One way of reaching a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorInfo {
    /// Stable id used by `connect`
    pub id: String,
    /// Display name
    pub name: String,
}

impl ConnectorInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// Snapshot of the wallet connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalletSession {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    /// Id of the connector that owns the connection
    pub connector: Option<String>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connecting(connector: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            connector: Some(connector.into()),
            ..Self::default()
        }
    }

    pub fn connected(connector: impl Into<String>, address: Address, chain_id: ChainId) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            address: Some(address),
            chain_id: Some(chain_id),
            connector: Some(connector.into()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.address.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    /// Connected address, if any
    pub fn account(&self) -> Option<&Address> {
        if self.is_connected() {
            self.address.as_ref()
        } else {
            None
        }
    }
}
