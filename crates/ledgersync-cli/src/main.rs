//! LedgerSync CLI - Command-line interface for LedgerSync
//!
//! Provides commands for:
//! - Reconciling a local ledger export with the remote transaction set
//! - Checking which record fields have no resolution strategy

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledgersync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{coverage::CoverageCommand, sync::SyncCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "ledgersync",
    version,
    about = "Field-level reconciliation of ledger and remote transactions"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile local and remote transactions
    Sync(SyncCommand),
    /// Report record fields that have no resolution strategy
    Coverage(CoverageCommand),
}

/// Picks the log filter: `-v` flags win over the configured level
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing
    let filter = log_filter(cli.verbose, &config.logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config_path = %config_path.display(), "Loaded configuration");

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&config, format).await,
        Commands::Coverage(cmd) => cmd.execute(&config, format).await,
    }
}
