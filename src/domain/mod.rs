//! Domain Layer - Core types and logic for the token dashboard
//!
//! Pure types with no I/O. All external interactions happen through the
//! ports layer.
//!
//! - `token`: market snapshot records
//! - `chain`: chain ids and named networks
//! - `session`: wallet connection snapshot and account addresses
//! - `balance`: native balance snapshot
//! - `verification`: address verification state machine
//! - `format`: display formatting for prices, caps, supply and badges

pub mod token;
pub mod chain;
pub mod session;
pub mod balance;
pub mod verification;
pub mod format;

pub use token::Token;
pub use chain::{ChainId, KnownChain};
pub use session::{Address, AddressError, ConnectionStatus, ConnectorInfo, WalletSession};
pub use balance::BalanceSnapshot;
pub use verification::{
    verification_message, SignFailure, SignRequest, VerificationFlags, VerificationMachine,
    VerificationState, USER_REJECTED_MESSAGE,
};
pub use format::{
    format_change, format_last_updated, format_price, format_supply, format_usd_compact,
    signature_preview, ChangeDirection,
};
