//! Wallet Widget
//!
//! Connect flow, address verification and the gated balance for the wallet
//! panel. The `apply_*`/`begin_*` methods are synchronous so the TUI can run
//! the wallet calls in spawned tasks and feed results back; the async
//! methods chain the same steps for headless use.

use std::sync::Arc;
use chrono::{DateTime, Utc};

use crate::domain::{
    signature_preview, Address, BalanceSnapshot, ChainId, ConnectionStatus, KnownChain, SignFailure,
    SignRequest, VerificationFlags, VerificationMachine, VerificationState, WalletSession,
};
use crate::ports::{SessionContext, WalletError, WalletErrorKind, WalletPort};

pub const WALLET_NOT_FOUND_ALERT: &str =
    "Wallet not found. Please make sure your wallet extension is installed and enabled.";
pub const CONNECT_REJECTED_MESSAGE: &str = "Connection request rejected in wallet";
pub const BALANCE_LOADING: &str = "Loading...";
pub const BALANCE_UNAVAILABLE: &str = "Unable to fetch balance";
pub const VERIFIED_LABEL: &str = "Address Verified";
pub const VERIFY_PROMPT: &str = "Sign a message to verify you own this address";

/// Result of a connect attempt as presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Session established; the menu closes
    Connected,
    /// Blocking alert with this text
    Alert(String),
    /// The user declined in the wallet; nothing to show
    Rejected,
}

impl ConnectOutcome {
    pub fn from_result(result: &Result<WalletSession, WalletError>) -> Self {
        match result {
            Ok(_) => ConnectOutcome::Connected,
            Err(e) => match e.kind() {
                WalletErrorKind::ProviderUnavailable => ConnectOutcome::Alert(WALLET_NOT_FOUND_ALERT.to_string()),
                WalletErrorKind::UserRejected => ConnectOutcome::Rejected,
                WalletErrorKind::Other => ConnectOutcome::Alert(format!("Connection failed: {}", e.message())),
            },
        }
    }

    /// Text for headless callers; `None` when connected
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ConnectOutcome::Connected => None,
            ConnectOutcome::Alert(text) => Some(text),
            ConnectOutcome::Rejected => Some(CONNECT_REJECTED_MESSAGE),
        }
    }
}

/// Native balance shown in the panel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BalanceState {
    /// Not requested (not connected or not verified)
    #[default]
    Idle,
    Loading,
    Loaded(BalanceSnapshot),
    Unavailable,
}

impl BalanceState {
    pub fn label(&self) -> Option<String> {
        match self {
            BalanceState::Idle => None,
            BalanceState::Loading => Some(BALANCE_LOADING.to_string()),
            BalanceState::Loaded(balance) => Some(balance.formatted()),
            BalanceState::Unavailable => Some(BALANCE_UNAVAILABLE.to_string()),
        }
    }
}

/// Everything the wallet panel renders while connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletStatusView {
    pub address: String,
    pub short_address: String,
    pub network: String,
    /// "Switch to BSC" when on another chain
    pub switch_offer: Option<String>,
    pub is_switching: bool,
    pub switch_error: Option<String>,
    pub verified: bool,
    pub is_signing: bool,
    pub verification_error: Option<String>,
    pub balance: Option<String>,
    pub signature_preview: Option<String>,
}

/// Address button text in the header
pub fn address_button_label(session: &WalletSession) -> String {
    match (session.status, session.account()) {
        (ConnectionStatus::Connected, Some(address)) => address.short(),
        (ConnectionStatus::Connecting, _) => "Connecting...".to_string(),
        _ => "Connect Wallet".to_string(),
    }
}

pub struct WalletWidget {
    wallet: Arc<dyn WalletPort>,
    session: SessionContext,
    machine: VerificationMachine,
    balance: BalanceState,
    balance_key: Option<(Address, ChainId)>,
    pending_sign: Option<SignRequest>,
    switching: bool,
    switch_error: Option<String>,
    last_connect_error: Option<String>,
}

impl WalletWidget {
    pub fn new(wallet: Arc<dyn WalletPort>, target_chain: ChainId) -> Self {
        let session = wallet.session();
        let mut widget = Self {
            wallet,
            session,
            machine: VerificationMachine::new(target_chain),
            balance: BalanceState::Idle,
            balance_key: None,
            pending_sign: None,
            switching: false,
            switch_error: None,
            last_connect_error: None,
        };
        widget.observe_session();
        widget
    }

    pub fn wallet(&self) -> Arc<dyn WalletPort> {
        self.wallet.clone()
    }

    pub fn session(&self) -> WalletSession {
        self.session.snapshot()
    }

    pub fn session_context(&self) -> SessionContext {
        self.session.clone()
    }

    pub fn verification(&self) -> &VerificationState {
        self.machine.state()
    }

    pub fn flags(&self) -> VerificationFlags {
        self.machine.flags()
    }

    pub fn balance(&self) -> &BalanceState {
        &self.balance
    }

    pub fn target_chain(&self) -> ChainId {
        self.machine.target_chain()
    }

    pub fn is_signing(&self) -> bool {
        self.pending_sign.is_some()
    }

    /// Error of the last failed connect, shown in the wallet menu
    pub fn last_connect_error(&self) -> Option<&str> {
        self.last_connect_error.as_deref()
    }

    /// Re-read the session; returns true if verification was reset
    pub fn observe_session(&mut self) -> bool {
        let session = self.session.snapshot();
        let reset = self.machine.observe_session(&session);
        if reset {
            self.pending_sign = None;
            self.switch_error = None;
        }
        if !self.machine.is_wrong_network(&session) {
            self.switch_error = None;
        }
        if self.machine.balance_query(&session).as_ref() != self.balance_key.as_ref() {
            self.balance = BalanceState::Idle;
            self.balance_key = None;
        }
        reset
    }

    pub fn apply_connect(&mut self, result: &Result<WalletSession, WalletError>) -> ConnectOutcome {
        let outcome = ConnectOutcome::from_result(result);
        match (&outcome, result) {
            (ConnectOutcome::Connected, _) => self.last_connect_error = None,
            (ConnectOutcome::Rejected, Err(e)) => {
                tracing::info!("User rejected the connection request: {}", e.message());
            }
            (_, Err(e)) => {
                tracing::warn!("Wallet connection failed: {}", e);
                self.last_connect_error = Some(e.message());
            }
            _ => {}
        }
        self.observe_session();
        outcome
    }

    /// Start a verification signature; `None` if not unverified or already signing
    pub fn begin_verify(&mut self, now: DateTime<Utc>) -> Option<SignRequest> {
        if self.pending_sign.is_some() {
            return None;
        }
        let request = self.machine.begin_signing(now)?;
        self.pending_sign = Some(request.clone());
        Some(request)
    }

    /// Apply a signature result; false if it no longer applies
    pub fn apply_signature(&mut self, request: &SignRequest, result: Result<String, WalletError>) -> bool {
        if self.pending_sign.as_ref() != Some(request) {
            tracing::debug!("Dropped signature for {}: not the pending request", request.address.short());
            return false;
        }
        self.pending_sign = None;
        if let Err(e) = &result {
            match e.kind() {
                WalletErrorKind::UserRejected => tracing::info!("User rejected the signing request"),
                _ => tracing::warn!("Signing failed: {}", e),
            }
        }
        let applied = self.machine.complete_signing(request, result.map_err(SignFailure::from));
        if !applied {
            tracing::debug!("Dropped signature for {}", request.address.short());
        } else if self.machine.is_verified() {
            tracing::info!("Address {} verified", request.address.short());
        }
        applied
    }

    /// Query to run for the balance, if one is needed now; marks it loading
    pub fn balance_request(&mut self) -> Option<(Address, ChainId)> {
        let session = self.session.snapshot();
        let query = self.machine.balance_query(&session);
        if query == self.balance_key {
            return None;
        }
        self.balance_key = query.clone();
        self.balance = match query {
            Some(_) => BalanceState::Loading,
            None => BalanceState::Idle,
        };
        query
    }

    pub fn apply_balance(&mut self, query: &(Address, ChainId), result: Result<BalanceSnapshot, WalletError>) {
        if self.balance_key.as_ref() != Some(query) {
            return;
        }
        self.balance = match result {
            Ok(balance) => BalanceState::Loaded(balance),
            Err(e) => {
                tracing::warn!("Balance fetch failed: {}", e);
                BalanceState::Unavailable
            }
        };
    }

    /// Chain to switch to, if the wallet is on the wrong network
    pub fn begin_switch(&mut self) -> Option<ChainId> {
        if self.switching || !self.machine.is_wrong_network(&self.session.snapshot()) {
            return None;
        }
        self.switching = true;
        self.switch_error = None;
        Some(self.machine.target_chain())
    }

    pub fn apply_switch(&mut self, result: Result<(), WalletError>) {
        self.switching = false;
        if let Err(e) = result {
            tracing::warn!("Network switch failed: {}", e);
            self.switch_error = Some(e.message());
        }
        self.observe_session();
    }

    pub fn status_view(&self) -> Option<WalletStatusView> {
        let session = self.session.snapshot();
        let address = session.account()?;
        let flags = self.machine.flags();
        let target = self.machine.target_chain();
        let target_name = KnownChain::from_id(target)
            .map(|c| c.short_name().to_string())
            .unwrap_or_else(|| target.label());

        Some(WalletStatusView {
            address: address.to_string(),
            short_address: address.short(),
            network: session.chain_id.map(|c| c.label()).unwrap_or_default(),
            switch_offer: self
                .machine
                .is_wrong_network(&session)
                .then(|| format!("Switch to {}", target_name)),
            is_switching: self.switching,
            switch_error: self.switch_error.clone(),
            verified: flags.verified,
            is_signing: self.pending_sign.is_some(),
            verification_error: flags.error,
            balance: self.balance.label(),
            signature_preview: flags.signature.as_deref().map(signature_preview),
        })
    }

    pub async fn connect(&mut self, connector_id: &str) -> ConnectOutcome {
        let result = self.wallet.connect(connector_id).await;
        self.apply_connect(&result)
    }

    pub async fn disconnect(&mut self) -> Result<(), WalletError> {
        self.wallet.disconnect().await?;
        self.observe_session();
        Ok(())
    }

    /// Sign the verification message; true when the address is now verified
    pub async fn verify(&mut self) -> bool {
        let Some(request) = self.begin_verify(Utc::now()) else {
            return self.machine.is_verified();
        };
        let result = self.wallet.sign_message(&request.message).await;
        self.apply_signature(&request, result);
        self.machine.is_verified()
    }

    pub async fn switch_network(&mut self) -> Result<(), WalletError> {
        let Some(chain) = self.begin_switch() else {
            return Ok(());
        };
        let result = self.wallet.switch_chain(chain).await;
        self.apply_switch(result.clone());
        result
    }

    pub async fn refresh_balance(&mut self) {
        if let Some(query) = self.balance_request() {
            let result = self.wallet.get_balance(&query.0, query.1).await;
            self.apply_balance(&query, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::MockWallet;
    use crate::ports::wallet::MockWalletPort;
    use crate::ports::SessionPublisher;
    use regex::Regex;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn alice() -> Address {
        Address::parse(ALICE).unwrap()
    }

    fn widget_with(wallet: Arc<MockWallet>) -> WalletWidget {
        WalletWidget::new(wallet, ChainId::BSC)
    }

    #[test]
    fn test_connect_outcomes() {
        assert_eq!(
            ConnectOutcome::from_result(&Err(WalletError::ProviderUnavailable("refused".into()))),
            ConnectOutcome::Alert(WALLET_NOT_FOUND_ALERT.to_string())
        );
        assert_eq!(
            ConnectOutcome::from_result(&Err(WalletError::UserRejected("nope".into()))),
            ConnectOutcome::Rejected
        );
        assert_eq!(
            ConnectOutcome::from_result(&Err(WalletError::Provider("Already processing eth_requestAccounts".into()))),
            ConnectOutcome::Alert("Connection failed: Already processing eth_requestAccounts".to_string())
        );
    }

    #[tokio::test]
    async fn test_rejected_connect_has_fixed_failure_message() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::BSC)
                .with_connect_result(Err(WalletError::UserRejected("User rejected the request.".into()))),
        );
        let mut widget = widget_with(wallet);

        let outcome = widget.connect("injected").await;

        assert_eq!(outcome, ConnectOutcome::Rejected);
        assert_eq!(outcome.failure_message(), Some("Connection request rejected in wallet"));
        assert_eq!(widget.last_connect_error(), None);
        assert_eq!(ConnectOutcome::Connected.failure_message(), None);
        assert_eq!(
            ConnectOutcome::Alert(WALLET_NOT_FOUND_ALERT.to_string()).failure_message(),
            Some(WALLET_NOT_FOUND_ALERT)
        );
    }

    #[test]
    fn test_address_button_label() {
        assert_eq!(address_button_label(&WalletSession::disconnected()), "Connect Wallet");
        assert_eq!(address_button_label(&WalletSession::connecting("frame")), "Connecting...");
        let connected = WalletSession::connected("frame", alice(), ChainId::BSC);
        assert_eq!(address_button_label(&connected), "0x1111...1111");
    }

    #[tokio::test]
    async fn test_connect_then_verify_then_balance() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::BSC)
                .with_sign_result(Ok("0xabc".repeat(20)))
                .with_balance_result(Ok(BalanceSnapshot::new(1_234_567_000_000_000_000, 18, "BNB", ChainId::BSC))),
        );
        let mut widget = widget_with(wallet.clone());

        assert_eq!(widget.connect("injected").await, ConnectOutcome::Connected);
        assert!(matches!(widget.verification(), VerificationState::Unverified { .. }));

        assert!(widget.verify().await);
        widget.refresh_balance().await;

        let view = widget.status_view().unwrap();
        assert!(view.verified);
        assert_eq!(view.balance.as_deref(), Some("1.2346 BNB"));
        assert_eq!(view.signature_preview.unwrap().len(), 53);
        assert_eq!(view.network, "BSC Mainnet");
        assert_eq!(view.switch_offer, None);
        assert_eq!(wallet.count_calls("balance:56"), 1);
    }

    #[tokio::test]
    async fn test_signed_message_format() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet);
        widget.connect("injected").await;

        let request = widget.begin_verify(Utc::now()).unwrap();
        let pattern = Regex::new(
            r"^Sign to verify your address: 0x1{40}\n\nTimestamp: \d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$",
        )
        .unwrap();
        assert!(pattern.is_match(&request.message));
        assert!(widget.is_signing());
        assert!(widget.begin_verify(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_rejected_signature_shows_fixed_text() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::BSC)
                .with_sign_result(Err(WalletError::UserRejected("User denied message signature.".into())))
                .with_sign_result(Err(WalletError::Provider("Ledger device locked".into()))),
        );
        let mut widget = widget_with(wallet);
        widget.connect("injected").await;

        assert!(!widget.verify().await);
        assert_eq!(widget.flags().error.as_deref(), Some("You rejected the signing request"));

        assert!(!widget.verify().await);
        assert_eq!(widget.flags().error.as_deref(), Some("Ledger device locked"));
    }

    #[tokio::test]
    async fn test_disconnect_from_verified_resets() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;
        widget.verify().await;
        widget.refresh_balance().await;
        assert!(widget.flags().verified);

        widget.disconnect().await.unwrap();

        assert_eq!(widget.flags(), VerificationFlags { verified: false, signature: None, error: None });
        assert_eq!(widget.balance(), &BalanceState::Idle);
        assert!(widget.status_view().is_none());
    }

    #[tokio::test]
    async fn test_balance_stops_after_disconnect_until_verified_again() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;
        assert!(widget.verify().await);
        widget.refresh_balance().await;
        assert!(matches!(widget.balance(), BalanceState::Loaded(_)));
        assert_eq!(wallet.count_calls("balance"), 1);

        widget.disconnect().await.unwrap();
        widget.refresh_balance().await;
        assert_eq!(wallet.count_calls("balance"), 1);
        assert_eq!(widget.balance(), &BalanceState::Idle);

        // Reconnected but unverified: still no query
        widget.connect("injected").await;
        widget.refresh_balance().await;
        assert_eq!(wallet.count_calls("balance"), 1);
        assert_eq!(widget.status_view().unwrap().balance, None);

        assert!(widget.verify().await);
        widget.refresh_balance().await;
        widget.refresh_balance().await;
        assert_eq!(wallet.count_calls("balance:56"), 2);
        assert!(matches!(widget.balance(), BalanceState::Loaded(_)));
    }

    #[tokio::test]
    async fn test_account_change_starts_unverified() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;
        widget.verify().await;
        assert!(widget.flags().verified);

        wallet.change_account(Address::parse(BOB).unwrap());
        assert!(widget.observe_session());

        match widget.verification() {
            VerificationState::Unverified { address, error } => {
                assert_eq!(address.as_str(), BOB);
                assert!(error.is_none());
            }
            other => panic!("expected unverified, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signature_after_account_change_is_dropped() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;

        let request = widget.begin_verify(Utc::now()).unwrap();
        wallet.change_account(Address::parse(BOB).unwrap());
        widget.observe_session();

        assert!(!widget.apply_signature(&request, Ok("0xlate".into())));
        assert!(!widget.flags().verified);
    }

    #[tokio::test]
    async fn test_signature_after_reconnect_of_same_account_is_dropped() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::BSC));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;

        let request = widget.begin_verify(Utc::now()).unwrap();
        widget.disconnect().await.unwrap();
        widget.connect("injected").await;
        assert!(!widget.is_signing());

        assert!(!widget.apply_signature(&request, Ok("0xstale".into())));
        assert!(!widget.flags().verified);
        assert!(!widget.status_view().unwrap().verified);
        widget.refresh_balance().await;
        assert_eq!(wallet.count_calls("balance"), 0);
    }

    #[tokio::test]
    async fn test_wrong_network_offers_switch_and_keeps_verification() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::ETHEREUM)
                .with_switch_result(Err(WalletError::UserRejected("User rejected the request.".into())))
                .with_switch_result(Ok(())),
        );
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;
        widget.verify().await;

        let view = widget.status_view().unwrap();
        assert_eq!(view.network, "Ethereum Mainnet");
        assert_eq!(view.switch_offer.as_deref(), Some("Switch to BSC"));
        assert!(view.verified);

        assert!(widget.switch_network().await.is_err());
        let view = widget.status_view().unwrap();
        assert_eq!(view.switch_error.as_deref(), Some("User rejected the request."));
        assert!(view.verified);

        widget.switch_network().await.unwrap();
        let view = widget.status_view().unwrap();
        assert_eq!(view.switch_offer, None);
        assert!(view.verified);
    }

    #[tokio::test]
    async fn test_balance_not_requested_until_verified() {
        let publisher = SessionPublisher::new();
        publisher.publish(WalletSession::connected("frame", alice(), ChainId::BSC));
        let context = publisher.context();

        let mut port = MockWalletPort::new();
        port.expect_session().returning(move || context.clone());
        port.expect_get_balance().never();

        let mut widget = WalletWidget::new(Arc::new(port), ChainId::BSC);
        widget.refresh_balance().await;

        assert_eq!(widget.balance(), &BalanceState::Idle);
        assert_eq!(widget.status_view().unwrap().balance, None);
    }

    #[tokio::test]
    async fn test_balance_failure_is_unavailable() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::BSC)
                .with_balance_result(Err(WalletError::Provider("rate limited".into()))),
        );
        let mut widget = widget_with(wallet);
        widget.connect("injected").await;
        widget.verify().await;

        let query = widget.balance_request().unwrap();
        assert_eq!(widget.balance().label().as_deref(), Some("Loading..."));
        assert_eq!(query.1, ChainId::BSC);

        widget.apply_balance(&query, Err(WalletError::Provider("rate limited".into())));
        assert_eq!(widget.balance().label().as_deref(), Some("Unable to fetch balance"));
    }

    #[tokio::test]
    async fn test_balance_uses_target_chain_on_wrong_network() {
        let wallet = Arc::new(MockWallet::new(alice(), ChainId::SEPOLIA));
        let mut widget = widget_with(wallet.clone());
        widget.connect("injected").await;
        widget.verify().await;
        widget.refresh_balance().await;

        assert_eq!(wallet.count_calls("balance:56"), 1);
        assert_eq!(widget.status_view().unwrap().network, "Sepolia Testnet");
    }

    #[tokio::test]
    async fn test_failed_connect_is_remembered_for_menu() {
        let wallet = Arc::new(
            MockWallet::new(alice(), ChainId::BSC)
                .with_connect_result(Err(WalletError::Provider("Request already pending".into()))),
        );
        let mut widget = widget_with(wallet);

        let outcome = widget.connect("frame").await;

        assert_eq!(outcome, ConnectOutcome::Alert("Connection failed: Request already pending".into()));
        assert_eq!(widget.last_connect_error(), Some("Request already pending"));
        assert_eq!(widget.verification(), &VerificationState::Disconnected);
    }
}
