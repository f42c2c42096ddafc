//! CLI Adapter
//!
//! Command-line interface for tokenboard.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, ConnectorsCmd, OutputFormat, RunCmd, TokensCmd, VerifyCmd};
