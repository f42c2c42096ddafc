//! Tokenboard - top tokens by market cap with an EVM wallet panel

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use tokenboard::adapters::cli::{CliApp, Command, ConnectorsCmd, OutputFormat, RunCmd, TokensCmd, VerifyCmd};
use tokenboard::adapters::coingecko::{CoinGeckoClient, CoinGeckoConfig};
use tokenboard::adapters::evm::{EvmWalletAdapter, EvmWalletConfig};
use tokenboard::adapters::tui::{self, App};
use tokenboard::application::token_table::{TokenTableView, TABLE_TITLE};
use tokenboard::application::{PollingPolicy, TokenPoller, WalletWidget};
use tokenboard::config::{load_config, Config, LoggingSection};
use tokenboard::ports::TokenFeed;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Tokens(cmd) => tokens_command(cmd, app.verbose, app.debug).await,
        Command::Connectors(cmd) => connectors_command(cmd, app.verbose, app.debug).await,
        Command::Verify(cmd) => verify_command(cmd, app.verbose, app.debug).await,
    }
}

/// Where log lines go
enum LogTarget {
    Stderr,
    /// The dashboard owns the terminal
    File,
}

fn init_logging(verbose: bool, debug: bool, logging: &LoggingSection, target: LogTarget) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    match target {
        LogTarget::Stderr => {
            fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
        }
        LogTarget::File => {
            let path = logging.log_file_path();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file)).init();
        }
    }
    Ok(())
}

fn load(path: &Path, verbose: bool, debug: bool, target: LogTarget) -> Result<Config> {
    let config = load_config(path).context("Failed to load configuration")?;
    init_logging(verbose, debug, &config.logging, target)?;
    tracing::info!("Config: {}", path.display());
    Ok(config)
}

fn build_wallet(config: &Config) -> Result<EvmWalletAdapter> {
    EvmWalletAdapter::with_config(EvmWalletConfig::from(config)).context("Failed to create wallet adapter")
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug, LogTarget::File)?;
    tracing::info!("Starting tokenboard dashboard...");

    let feed = CoinGeckoClient::with_config(CoinGeckoConfig::from(&config.market_data))
        .context("Failed to create market data client")?;
    let poller = TokenPoller::new(Arc::new(feed), PollingPolicy::from(&config.polling));

    let wallet = Arc::new(build_wallet(&config)?);
    let widget = WalletWidget::new(wallet, config.wallet.target_chain());

    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(poller, widget, tx);

    tui::run(app, rx, config.wallet.session_poll()).await.context("Dashboard failed")?;
    Ok(())
}

async fn tokens_command(cmd: TokensCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug, LogTarget::Stderr)?;
    let feed = CoinGeckoClient::with_config(CoinGeckoConfig::from(&config.market_data))
        .context("Failed to create market data client")?;

    let tokens = feed.fetch_tokens().await.context("Failed to fetch tokens")?;

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        OutputFormat::Text => {
            let poller_snapshot = tokenboard::application::TokenSnapshot {
                tokens,
                updated_at: Some(chrono::Utc::now()),
                ..Default::default()
            };
            let view = TokenTableView::build(&poller_snapshot, chrono::Utc::now());

            println!("{}", TABLE_TITLE);
            println!(
                "{:>3}  {:<8} {:<20} {:>14} {:>9} {:>11} {:>11} {:>9}",
                "#", "Symbol", "Name", "Price", "24h", "Market Cap", "Volume", "Supply"
            );
            for row in &view.rows {
                println!(
                    "{:>3}  {:<8} {:<20} {:>14} {:>9} {:>11} {:>11} {:>9}",
                    row.rank,
                    row.symbol,
                    truncate(&row.name, 20),
                    row.price,
                    format!("{}{}", row.direction.arrow(), row.change),
                    row.market_cap,
                    row.volume,
                    row.supply
                );
            }
        }
    }

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

async fn connectors_command(cmd: ConnectorsCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug, LogTarget::Stderr)?;
    let wallet = build_wallet(&config)?;

    for (info, available) in wallet.probe_connectors().await {
        let status = if available { "available" } else { "not found" };
        println!("{:<12} {:<24} {}", info.id, info.name, status);
    }

    Ok(())
}

async fn verify_command(cmd: VerifyCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug, LogTarget::Stderr)?;

    let connector = match cmd.connector {
        Some(id) => id,
        None => match config.wallet.resolved_connectors().first() {
            Some(section) => section.id.clone(),
            None => bail!("No wallet connectors configured"),
        },
    };

    let wallet = Arc::new(build_wallet(&config)?);
    let mut widget = WalletWidget::new(wallet, config.wallet.target_chain());

    let outcome = widget.connect(&connector).await;
    if let Some(message) = outcome.failure_message() {
        bail!("{}", message);
    }

    let session = widget.session();
    if let (Some(address), Some(chain)) = (session.account(), session.chain_id) {
        println!("Connected: {} on {}", address, chain.label());
    }

    if cmd.switch {
        widget.switch_network().await.context("Network switch failed")?;
        println!("Switched to {}", widget.target_chain().label());
    }

    if !widget.verify().await {
        let reason = widget.flags().error.unwrap_or_else(|| "unknown error".to_string());
        bail!("Verification failed: {}", reason);
    }
    if let Some(view) = widget.status_view() {
        println!("Address Verified");
        if let Some(signature) = view.signature_preview {
            println!("Signature: {}", signature);
        }
    }

    widget.refresh_balance().await;
    if let Some(balance) = widget.balance().label() {
        println!("Balance: {}", balance);
    }

    Ok(())
}
