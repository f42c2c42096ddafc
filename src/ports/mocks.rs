use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{Address, BalanceSnapshot, ChainId, ConnectorInfo, WalletSession};
use super::market_data::{MarketDataError, TokenFeed};
use super::session::{SessionContext, SessionPublisher};
use super::wallet::{WalletError, WalletPort};
use crate::domain::Token;

/// Token feed that replays scripted responses and counts calls
///
/// With `gated()`, every fetch waits for a `release()` before answering, so
/// tests can hold a request in flight.
#[derive(Debug, Default)]
pub struct MockTokenFeed {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Result<Vec<Token>, MarketDataError>>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockTokenFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed whose fetches block until released
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Builder method to queue a response
    pub fn with_response(self, response: Result<Vec<Token>, MarketDataError>) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: Result<Vec<Token>, MarketDataError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Let `n` pending or future fetches complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenFeed for MockTokenFeed {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| MarketDataError::Network(e.to_string()))?
                .forget();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MarketDataError::Network("No response configured".to_string())))
    }
}

/// Wallet recording every call, with scripted results
///
/// Successful connects publish a connected session for `address` on `chain`.
#[derive(Debug)]
pub struct MockWallet {
    publisher: SessionPublisher,
    connectors: Vec<ConnectorInfo>,
    address: Mutex<Address>,
    chain: Mutex<ChainId>,
    calls: Mutex<Vec<String>>,
    connect_results: Mutex<VecDeque<Result<(), WalletError>>>,
    sign_results: Mutex<VecDeque<Result<String, WalletError>>>,
    switch_results: Mutex<VecDeque<Result<(), WalletError>>>,
    balance_results: Mutex<VecDeque<Result<BalanceSnapshot, WalletError>>>,
}

impl MockWallet {
    pub fn new(address: Address, chain: ChainId) -> Self {
        Self {
            publisher: SessionPublisher::new(),
            connectors: vec![
                ConnectorInfo::new("injected", "Injected"),
                ConnectorInfo::new("frame", "Frame"),
            ],
            address: Mutex::new(address),
            chain: Mutex::new(chain),
            calls: Mutex::new(Vec::new()),
            connect_results: Mutex::new(VecDeque::new()),
            sign_results: Mutex::new(VecDeque::new()),
            switch_results: Mutex::new(VecDeque::new()),
            balance_results: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_connect_result(self, result: Result<(), WalletError>) -> Self {
        self.connect_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_sign_result(self, result: Result<String, WalletError>) -> Self {
        self.sign_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_switch_result(self, result: Result<(), WalletError>) -> Self {
        self.switch_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_balance_result(self, result: Result<BalanceSnapshot, WalletError>) -> Self {
        self.balance_results.lock().unwrap().push_back(result);
        self
    }

    /// Simulate the user picking another account inside the wallet
    pub fn change_account(&self, address: Address) {
        *self.address.lock().unwrap() = address.clone();
        let current = self.publisher.current();
        if current.is_connected() {
            let connector = current.connector.unwrap_or_default();
            self.publisher.publish(WalletSession::connected(connector, address, *self.chain.lock().unwrap()));
        }
    }

    /// Simulate the wallet dropping the connection
    pub fn drop_connection(&self) {
        self.publisher.publish(WalletSession::disconnected());
    }

    /// All recorded calls, e.g. `connect:injected`, `sign`, `balance:56`
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletPort for MockWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        self.connectors.clone()
    }

    fn session(&self) -> SessionContext {
        self.publisher.context()
    }

    async fn connect(&self, connector_id: &str) -> Result<WalletSession, WalletError> {
        self.record(format!("connect:{}", connector_id));
        let result = self.connect_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        match result {
            Ok(()) => {
                let session = WalletSession::connected(
                    connector_id,
                    self.address.lock().unwrap().clone(),
                    *self.chain.lock().unwrap(),
                );
                self.publisher.publish(session.clone());
                Ok(session)
            }
            Err(e) => {
                self.publisher.publish(WalletSession::disconnected());
                Err(e)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.record("disconnect".to_string());
        self.publisher.publish(WalletSession::disconnected());
        Ok(())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.record(format!("switch:{}", chain_id));
        let result = self.switch_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            *self.chain.lock().unwrap() = chain_id;
            let mut session = self.publisher.current();
            if session.is_connected() {
                session.chain_id = Some(chain_id);
                self.publisher.publish(session);
            }
        }
        result
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.record("sign".to_string());
        if !self.publisher.current().is_connected() {
            return Err(WalletError::NotConnected);
        }
        self.sign_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("0x{}", hex::encode(message.as_bytes()))))
    }

    async fn get_balance(&self, _address: &Address, chain_id: ChainId) -> Result<BalanceSnapshot, WalletError> {
        self.record(format!("balance:{}", chain_id));
        self.balance_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BalanceSnapshot::new(0, 18, "BNB", chain_id)))
    }

    async fn sync(&self) -> Result<(), WalletError> {
        self.record("sync".to_string());
        Ok(())
    }
}
