//! EVM Wallet Adapter
//!
//! `WalletPort` over configured EIP-1193 providers, with balances read from
//! per-chain RPC endpoints. This adapter is the only writer of the session.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;

use crate::config::{ChainSection, Config, ConnectorSection};
use crate::domain::{Address, BalanceSnapshot, ChainId, ConnectorInfo, WalletSession};
use crate::ports::{SessionContext, SessionPublisher, WalletError, WalletErrorKind, WalletPort};
use super::provider::Eip1193Provider;
use super::rpc::JsonRpcClient;

/// Configuration for the EvmWalletAdapter
#[derive(Debug, Clone)]
pub struct EvmWalletConfig {
    pub connectors: Vec<ConnectorSection>,
    pub chains: Vec<ChainSection>,
    /// Timeout for provider requests, including the time the user takes to answer a prompt
    pub request_timeout: Duration,
}

impl From<&Config> for EvmWalletConfig {
    fn from(config: &Config) -> Self {
        Self {
            connectors: config.wallet.resolved_connectors(),
            chains: config.chains.clone(),
            request_timeout: config.wallet.request_timeout(),
        }
    }
}

#[derive(Debug)]
struct ChainEndpoint {
    rpc: JsonRpcClient,
    symbol: String,
    decimals: u8,
}

/// Wallet adapter for EVM chains
#[derive(Debug)]
pub struct EvmWalletAdapter {
    providers: Vec<Eip1193Provider>,
    chains: HashMap<ChainId, ChainEndpoint>,
    publisher: SessionPublisher,
}

impl EvmWalletAdapter {
    pub fn with_config(config: EvmWalletConfig) -> Result<Self, WalletError> {
        let providers = config
            .connectors
            .iter()
            .map(|c| {
                Eip1193Provider::new(
                    ConnectorInfo::new(c.id.clone(), c.name.clone()),
                    c.provider_url.clone(),
                    config.request_timeout,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut chains = HashMap::new();
        for chain in &config.chains {
            let rpc = JsonRpcClient::new(chain.rpc_url.clone(), config.request_timeout)?;
            chains.insert(
                ChainId(chain.chain_id),
                ChainEndpoint {
                    rpc,
                    symbol: chain.native_symbol.clone(),
                    decimals: chain.decimals,
                },
            );
        }

        Ok(Self {
            providers,
            chains,
            publisher: SessionPublisher::new(),
        })
    }

    fn provider(&self, connector_id: &str) -> Result<&Eip1193Provider, WalletError> {
        self.providers
            .iter()
            .find(|p| p.info().id == connector_id)
            .ok_or_else(|| WalletError::UnknownConnector(connector_id.to_string()))
    }

    /// Provider and account of the current connection
    fn active(&self) -> Result<(&Eip1193Provider, WalletSession), WalletError> {
        let session = self.publisher.current();
        if !session.is_connected() {
            return Err(WalletError::NotConnected);
        }
        let connector = session.connector.clone().ok_or(WalletError::NotConnected)?;
        Ok((self.provider(&connector)?, session))
    }

    /// Connectors answering `eth_chainId` right now
    pub async fn probe_connectors(&self) -> Vec<(ConnectorInfo, bool)> {
        let mut result = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            result.push((provider.info().clone(), provider.probe().await));
        }
        result
    }

    async fn open_session(&self, provider: &Eip1193Provider) -> Result<WalletSession, WalletError> {
        let accounts = provider.request_accounts().await?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::Provider("No accounts returned by wallet".to_string()))?;
        let chain_id = provider.chain_id().await?;
        Ok(WalletSession::connected(provider.info().id.clone(), address, chain_id))
    }
}

#[async_trait]
impl WalletPort for EvmWalletAdapter {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        self.providers.iter().map(|p| p.info().clone()).collect()
    }

    fn session(&self) -> SessionContext {
        self.publisher.context()
    }

    async fn connect(&self, connector_id: &str) -> Result<WalletSession, WalletError> {
        let provider = self.provider(connector_id)?;
        tracing::info!("Connecting to {} at {}", provider.info().name, provider.url());
        self.publisher.publish(WalletSession::connecting(connector_id));

        match self.open_session(provider).await {
            Ok(session) => {
                tracing::info!(
                    "Connected {} on {}",
                    session.address.as_ref().map(Address::short).unwrap_or_default(),
                    session.chain_id.map(|c| c.label()).unwrap_or_default()
                );
                self.publisher.publish(session.clone());
                Ok(session)
            }
            Err(e) => {
                tracing::warn!("Connect via {} failed: {}", connector_id, e);
                self.publisher.publish(WalletSession::disconnected());
                Err(e)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        tracing::info!("Wallet disconnected");
        self.publisher.publish(WalletSession::disconnected());
        Ok(())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        let (provider, session) = self.active()?;

        if let Err(e) = provider.switch_chain(chain_id).await {
            tracing::warn!("Switch to {} failed: {}", chain_id.label(), e);
            return Err(e);
        }

        // The wallet may land on a different chain than asked; trust it
        let actual = provider.chain_id().await.unwrap_or(chain_id);
        let mut updated = session.clone();
        updated.chain_id = Some(actual);
        if !self.publisher.publish_if(|current| same_connection(&session, current), updated) {
            tracing::debug!("Session changed during network switch; not published");
            return Ok(());
        }
        tracing::info!("Switched network to {}", actual.label());
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let (provider, session) = self.active()?;
        let address = session.address.ok_or(WalletError::NotConnected)?;
        tracing::debug!("Requesting personal_sign from {}", address.short());
        provider.personal_sign(message, &address).await
    }

    async fn get_balance(&self, address: &Address, chain_id: ChainId) -> Result<BalanceSnapshot, WalletError> {
        let endpoint = self
            .chains
            .get(&chain_id)
            .ok_or(WalletError::UnsupportedChain(chain_id))?;

        // Chain RPC failures are not wallet failures; keep their message only
        let value = endpoint
            .rpc
            .get_balance(address.as_str())
            .await
            .map_err(|e| WalletError::Provider(e.to_string()))?;

        Ok(BalanceSnapshot::new(value, endpoint.decimals, endpoint.symbol.clone(), chain_id))
    }

    async fn sync(&self) -> Result<(), WalletError> {
        let (provider, session) = match self.active() {
            Ok(active) => active,
            Err(WalletError::NotConnected) => return Ok(()),
            Err(e) => return Err(e),
        };

        let still_current = |current: &WalletSession| same_connection(&session, current);

        let accounts = match provider.accounts().await {
            Ok(accounts) => accounts,
            Err(e) if e.kind() == WalletErrorKind::ProviderUnavailable => {
                if self.publisher.publish_if(still_current, WalletSession::disconnected()) {
                    tracing::warn!("Wallet provider went away: {}", e);
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let Some(address) = accounts.into_iter().next() else {
            if self.publisher.publish_if(still_current, WalletSession::disconnected()) {
                tracing::info!("Wallet revoked account access");
            }
            return Ok(());
        };

        let chain_id = provider.chain_id().await?;
        let connector = session.connector.clone().unwrap_or_default();
        let updated = WalletSession::connected(connector, address, chain_id);
        let changed = updated != session;
        if !self.publisher.publish_if(still_current, updated) {
            tracing::debug!("Session changed during sync; not published");
        } else if changed {
            tracing::info!("Wallet session changed");
        }
        Ok(())
    }
}

/// True while `current` is still the connection a request was issued for
fn same_connection(expected: &WalletSession, current: &WalletSession) -> bool {
    current.is_connected() && current.connector == expected.connector && current.address == expected.address
}
