//! EVM Wallet Adapter
//!
//! Talks to wallets that expose an EIP-1193 provider as a JSON-RPC endpoint
//! (desktop wallets such as Frame do this on localhost):
//! - `eth_requestAccounts` / `eth_accounts` / `eth_chainId` for the session
//! - `personal_sign` for address verification
//! - `wallet_switchEthereumChain` for the network switch offer
//! - `eth_getBalance` against the configured per-chain RPC endpoint
//!
//! Provider errors are classified here into `WalletErrorKind` (4001 means
//! the user rejected, 4900/4901 or a refused connection means no provider).

mod adapter;
mod provider;
mod rpc;
mod types;

pub use adapter::{EvmWalletAdapter, EvmWalletConfig};
pub use provider::Eip1193Provider;
pub use rpc::{JsonRpcClient, RpcError};
