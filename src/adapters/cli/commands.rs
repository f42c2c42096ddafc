//! CLI Commands
//!
//! Argument definitions for the tokenboard binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tokenboard - top tokens by market cap with an EVM wallet panel
#[derive(Parser, Debug)]
#[command(
    name = "tokenboard",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Top tokens by market cap with an EVM wallet panel",
    long_about = "Tokenboard shows the top tokens by market cap from CoinGecko, refreshed \
                  in the background, next to a wallet panel that connects an EIP-1193 \
                  provider, verifies the address by signature and reads the BSC balance."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive dashboard
    Run(RunCmd),

    /// Print the token table once
    Tokens(TokensCmd),

    /// List configured wallet connectors and whether they respond
    Connectors(ConnectorsCmd),

    /// Connect, sign the verification message and read the balance
    Verify(VerifyCmd),
}

/// Open the dashboard
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/dashboard.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One-shot token table
#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/dashboard.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// List connectors
#[derive(Parser, Debug)]
pub struct ConnectorsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/dashboard.toml")]
    pub config: PathBuf,
}

/// Headless verification
#[derive(Parser, Debug)]
pub struct VerifyCmd {
    /// Connector id (defaults to the first configured connector)
    #[arg(value_name = "CONNECTOR")]
    pub connector: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/dashboard.toml")]
    pub config: PathBuf,

    /// Ask the wallet to switch to the target chain before signing
    #[arg(long)]
    pub switch: bool,
}
