//! Address Verification
//!
//! Client-local proof of address control: the user signs a message that
//! embeds their address and an ISO-8601 timestamp. Nothing checks the
//! signature server-side, so a `Verified` state is cosmetic.
//!
//! States:
//! - `Disconnected`: no account
//! - `Unverified`: connected, not signed yet (optionally carrying the last error)
//! - `Verified`: signed; cleared on disconnect or account change
//!
//! The wrong-network condition is tracked independently and never changes
//! the verification state.

use chrono::{DateTime, SecondsFormat, Utc};

use super::chain::ChainId;
use super::session::{Address, WalletSession};

/// Shown when the wallet reports a user rejection
pub const USER_REJECTED_MESSAGE: &str = "You rejected the signing request";

/// Why a signature attempt failed, as classified by the wallet adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignFailure {
    UserRejected,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VerificationState {
    #[default]
    Disconnected,
    Unverified {
        address: Address,
        error: Option<String>,
    },
    Verified {
        address: Address,
        signature: String,
        signed_at: DateTime<Utc>,
    },
}

/// Flat view of the verification state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationFlags {
    pub verified: bool,
    pub signature: Option<String>,
    pub error: Option<String>,
}

/// Message handed to the wallet for one signature attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub address: Address,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Machine epoch the request was issued in
    pub epoch: u64,
}

/// Build the text the user signs
pub fn verification_message(address: &Address, timestamp: DateTime<Utc>) -> String {
    format!(
        "Sign to verify your address: {}\n\nTimestamp: {}",
        address,
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Verification lifecycle for one wallet session
#[derive(Debug, Clone)]
pub struct VerificationMachine {
    state: VerificationState,
    target_chain: ChainId,
    /// Bumped on every reset; requests from an older epoch are stale
    epoch: u64,
}

impl VerificationMachine {
    pub fn new(target_chain: ChainId) -> Self {
        Self {
            state: VerificationState::Disconnected,
            target_chain,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    pub fn target_chain(&self) -> ChainId {
        self.target_chain
    }

    /// Follow the wallet session. Returns true if the state was reset.
    ///
    /// Disconnecting, or connecting with a different address, discards any
    /// signature and error.
    pub fn observe_session(&mut self, session: &WalletSession) -> bool {
        let next = match (session.account(), &self.state) {
            (None, VerificationState::Disconnected) => return false,
            (None, _) => VerificationState::Disconnected,
            (Some(account), VerificationState::Unverified { address, .. })
            | (Some(account), VerificationState::Verified { address, .. })
                if account == address =>
            {
                return false;
            }
            (Some(account), _) => VerificationState::Unverified {
                address: account.clone(),
                error: None,
            },
        };

        tracing::debug!(from = ?self.state_name(), "Verification state reset");
        self.state = next;
        self.epoch = self.epoch.wrapping_add(1);
        true
    }

    /// Start a signature attempt. Only valid while unverified; clears the
    /// previous error.
    pub fn begin_signing(&mut self, now: DateTime<Utc>) -> Option<SignRequest> {
        match &mut self.state {
            VerificationState::Unverified { address, error } => {
                *error = None;
                Some(SignRequest {
                    address: address.clone(),
                    message: verification_message(address, now),
                    timestamp: now,
                    epoch: self.epoch,
                })
            }
            _ => None,
        }
    }

    /// Apply the wallet's answer to `request`. Results issued before the last
    /// reset, even for the same address, are dropped; returns false in that case.
    pub fn complete_signing(
        &mut self,
        request: &SignRequest,
        result: Result<String, SignFailure>,
    ) -> bool {
        let current = match &self.state {
            VerificationState::Unverified { address, .. } => address,
            _ => return false,
        };
        if request.epoch != self.epoch || *current != request.address {
            return false;
        }

        self.state = match result {
            Ok(signature) => VerificationState::Verified {
                address: request.address.clone(),
                signature,
                signed_at: request.timestamp,
            },
            Err(SignFailure::UserRejected) => VerificationState::Unverified {
                address: request.address.clone(),
                error: Some(USER_REJECTED_MESSAGE.to_string()),
            },
            Err(SignFailure::Other(message)) => VerificationState::Unverified {
                address: request.address.clone(),
                error: Some(message),
            },
        };
        true
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state, VerificationState::Verified { .. })
    }

    pub fn flags(&self) -> VerificationFlags {
        match &self.state {
            VerificationState::Disconnected => VerificationFlags::default(),
            VerificationState::Unverified { error, .. } => VerificationFlags {
                verified: false,
                signature: None,
                error: error.clone(),
            },
            VerificationState::Verified { signature, .. } => VerificationFlags {
                verified: true,
                signature: Some(signature.clone()),
                error: None,
            },
        }
    }

    /// True when the session is on a chain other than the target
    pub fn is_wrong_network(&self, session: &WalletSession) -> bool {
        session.is_connected() && session.chain_id != Some(self.target_chain)
    }

    /// Address and chain to query the balance for; `None` unless the session
    /// is connected and the same account is verified.
    pub fn balance_query(&self, session: &WalletSession) -> Option<(Address, ChainId)> {
        let account = session.account()?;
        match &self.state {
            VerificationState::Verified { address, .. } if address == account => {
                Some((address.clone(), self.target_chain))
            }
            _ => None,
        }
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            VerificationState::Disconnected => "disconnected",
            VerificationState::Unverified { .. } => "unverified",
            VerificationState::Verified { .. } => "verified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn session(address: &str, chain: ChainId) -> WalletSession {
        WalletSession::connected("injected", Address::parse(address).unwrap(), chain)
    }

    fn verified_machine() -> VerificationMachine {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();
        assert!(machine.complete_signing(&request, Ok("0xsig".to_string())));
        machine
    }

    #[test]
    fn test_connect_starts_unverified() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        assert_eq!(machine.state(), &VerificationState::Disconnected);

        assert!(machine.observe_session(&session(ALICE, ChainId::BSC)));
        assert!(matches!(machine.state(), VerificationState::Unverified { error: None, .. }));
        assert!(!machine.is_verified());
    }

    #[test]
    fn test_message_embeds_address_and_timestamp() {
        let address = Address::parse(ALICE).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            verification_message(&address, at),
            format!("Sign to verify your address: {}\n\nTimestamp: 2024-05-01T12:30:00.000Z", ALICE)
        );
    }

    #[test]
    fn test_sign_success_verifies() {
        let machine = verified_machine();
        assert!(machine.is_verified());
        let flags = machine.flags();
        assert!(flags.verified);
        assert_eq!(flags.signature.as_deref(), Some("0xsig"));
        assert_eq!(flags.error, None);
    }

    #[test]
    fn test_user_rejection_uses_fixed_message() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();
        machine.complete_signing(&request, Err(SignFailure::UserRejected));

        assert_eq!(machine.flags().error.as_deref(), Some(USER_REJECTED_MESSAGE));
        assert!(!machine.is_verified());
    }

    #[test]
    fn test_other_failure_keeps_provider_text() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();
        machine.complete_signing(
            &request,
            Err(SignFailure::Other("Internal JSON-RPC error: ledger locked".to_string())),
        );

        assert_eq!(
            machine.flags().error.as_deref(),
            Some("Internal JSON-RPC error: ledger locked")
        );
    }

    #[test]
    fn test_new_attempt_clears_error() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();
        machine.complete_signing(&request, Err(SignFailure::UserRejected));

        machine.begin_signing(Utc::now()).unwrap();
        assert_eq!(machine.flags().error, None);
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let mut machine = verified_machine();
        assert!(machine.observe_session(&WalletSession::disconnected()));

        assert_eq!(machine.state(), &VerificationState::Disconnected);
        assert_eq!(
            machine.flags(),
            VerificationFlags { verified: false, signature: None, error: None }
        );
    }

    #[test]
    fn test_account_change_starts_unverified() {
        let mut machine = verified_machine();
        assert!(machine.observe_session(&session(BOB, ChainId::BSC)));

        match machine.state() {
            VerificationState::Unverified { address, error } => {
                assert_eq!(address.as_str(), BOB);
                assert!(error.is_none());
            }
            other => panic!("expected unverified, got {:?}", other),
        }
    }

    #[test]
    fn test_same_session_is_not_a_reset() {
        let mut machine = verified_machine();
        assert!(!machine.observe_session(&session(ALICE, ChainId::BSC)));
        // chain changes do not invalidate verification
        assert!(!machine.observe_session(&session(ALICE, ChainId::ETHEREUM)));
        assert!(machine.is_verified());
    }

    #[test]
    fn test_stale_signature_is_dropped() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();

        machine.observe_session(&session(BOB, ChainId::BSC));
        assert!(!machine.complete_signing(&request, Ok("0xsig".to_string())));
        assert!(!machine.is_verified());

        machine.observe_session(&WalletSession::disconnected());
        assert!(!machine.complete_signing(&request, Ok("0xsig".to_string())));
        assert_eq!(machine.state(), &VerificationState::Disconnected);
    }

    #[test]
    fn test_signature_from_before_reconnect_is_dropped() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        machine.observe_session(&session(ALICE, ChainId::BSC));
        let request = machine.begin_signing(Utc::now()).unwrap();

        // Same account comes back after a disconnect
        machine.observe_session(&WalletSession::disconnected());
        machine.observe_session(&session(ALICE, ChainId::BSC));

        assert!(!machine.complete_signing(&request, Ok("0xstale".to_string())));
        assert!(!machine.is_verified());
        assert!(matches!(machine.state(), VerificationState::Unverified { error: None, .. }));

        let fresh = machine.begin_signing(Utc::now()).unwrap();
        assert!(machine.complete_signing(&fresh, Ok("0xsig".to_string())));
        assert!(machine.is_verified());
    }

    #[test]
    fn test_cannot_sign_when_disconnected_or_verified() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        assert!(machine.begin_signing(Utc::now()).is_none());

        let mut machine = verified_machine();
        assert!(machine.begin_signing(Utc::now()).is_none());
    }

    #[test]
    fn test_wrong_network_does_not_block_signing() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        let on_mainnet = session(ALICE, ChainId::ETHEREUM);
        machine.observe_session(&on_mainnet);

        assert!(machine.is_wrong_network(&on_mainnet));
        assert!(machine.begin_signing(Utc::now()).is_some());
        assert!(!machine.is_wrong_network(&session(ALICE, ChainId::BSC)));
        assert!(!machine.is_wrong_network(&WalletSession::disconnected()));
    }

    #[test]
    fn test_balance_query_requires_connected_and_verified() {
        let mut machine = VerificationMachine::new(ChainId::BSC);
        let connected = session(ALICE, ChainId::ETHEREUM);
        assert_eq!(machine.balance_query(&connected), None);

        machine.observe_session(&connected);
        assert_eq!(machine.balance_query(&connected), None);

        let request = machine.begin_signing(Utc::now()).unwrap();
        machine.complete_signing(&request, Ok("0xsig".to_string()));
        let (address, chain) = machine.balance_query(&connected).unwrap();
        assert_eq!(address.as_str(), ALICE);
        // always the target chain, whatever the wallet is on
        assert_eq!(chain, ChainId::BSC);

        assert_eq!(machine.balance_query(&WalletSession::disconnected()), None);
    }
}
