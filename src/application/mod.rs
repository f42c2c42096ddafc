//! Application Layer
//!
//! - `polling`: token list cache with coalesced refetching
//! - `wallet_widget`: connect flow, verification and gated balance
//! - `token_table`: table rows, status and buy gating

pub mod polling;
pub mod wallet_widget;
pub mod token_table;

pub use polling::{FetchOutcome, FetchTrigger, PollingPolicy, TokenPoller, TokenSnapshot};
pub use wallet_widget::{address_button_label, BalanceState, ConnectOutcome, WalletStatusView, WalletWidget};
pub use token_table::{buy, buy_button_label, BuyOutcome, TableStatus, TokenRow, TokenTableView};
