//! Sync command - Reconcile local and remote transactions
//!
//! Provides the `ledgersync sync` CLI command which:
//! 1. Validates the configuration and reads the local records
//! 2. Reads the remote records from a file, or fetches them from the API
//! 3. Wires the API client, changelog and reporter into a Synchronizer
//! 4. Runs it and displays the per-transaction outcome and summary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use ledgersync_api::ApiClient;
use ledgersync_audit::JsonlChangelog;
use ledgersync_conflict::ResolutionEngine;
use ledgersync_core::config::Config;
use ledgersync_core::domain::{FieldRegistry, SyncStatus, SyncSummary, TransactionResult};
use ledgersync_sync::{SyncError, Synchronizer, TracingSyncReporter};
use tracing::{debug, info};

use crate::commands::read_records;
use crate::output::{counted, Console, OutputFormat};

/// Environment variable overriding `api.access_token`
const ACCESS_TOKEN_ENV: &str = "LEDGERSYNC_ACCESS_TOKEN";

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// JSON file with the local ledger's transaction records
    #[arg(long, value_name = "FILE")]
    pub local: PathBuf,

    /// JSON file with the remote records (fetched from the API when omitted)
    #[arg(long, value_name = "FILE")]
    pub remote: Option<PathBuf>,

    /// Resolve everything without writing to the remote API or the changelog
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let console = Console::new(format);

        let config_errors = config.validate();
        if !config_errors.is_empty() {
            for error in &config_errors {
                console.problem(error);
            }
            return Err(anyhow!(
                "Configuration has {}",
                counted(config_errors.len(), "error")
            ));
        }

        let dry_run = self.dry_run || config.sync.dry_run;
        if dry_run {
            console.note("Dry run mode - no changes will be written");
        }

        let registry = Arc::new(FieldRegistry::default());
        let client = Arc::new(self.build_client(config, Arc::clone(&registry), dry_run)?);

        let local = read_records(&self.local)?;
        let remote = match &self.remote {
            Some(path) => read_records(path)?,
            None => {
                console.note("Fetching remote transactions...");
                client
                    .get_transactions()
                    .await
                    .context("Failed to fetch remote transactions")?
            }
        };
        info!(local = local.len(), remote = remote.len(), "Loaded transaction records");

        let synchronizer = Synchronizer::new(
            ResolutionEngine::new(registry),
            client,
            Arc::new(JsonlChangelog::new(&config.sync.changelog)),
            Arc::new(TracingSyncReporter::new()),
        )
        .with_dry_run(dry_run);

        let outcome = match synchronizer.synchronize(&local, &remote).await {
            Ok(outcome) => outcome,
            Err(SyncError::Validation(report)) => {
                for issue in report.issues() {
                    console.problem(issue);
                }
                return Err(anyhow!(
                    "Input validation failed with {}",
                    counted(report.issues().len(), "issue")
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if console.is_json() {
            console.document(&serde_json::json!({
                "summary": outcome.summary,
                "results": outcome.results,
            }))?;
        } else {
            display_results(&console, &outcome.results);
            display_summary(&console, &outcome.summary);
        }

        if outcome.summary.errors > 0 {
            return Err(anyhow!(
                "{} failed to synchronize",
                counted(outcome.summary.errors as usize, "transaction")
            ));
        }
        Ok(())
    }

    /// Builds the API client
    ///
    /// A dry run over two local files never contacts the API, so it does
    /// not need an access token.
    fn build_client(
        &self,
        config: &Config,
        registry: Arc<FieldRegistry>,
        dry_run: bool,
    ) -> Result<ApiClient> {
        let mut api = config.api.clone();
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            api.access_token = Some(token);
        }

        if api.access_token.is_none() && dry_run && self.remote.is_some() {
            debug!("No access token configured, using an offline client for the dry run");
            return Ok(ApiClient::with_base_url("", api.base_url, registry));
        }

        ApiClient::from_config(&api, registry).with_context(|| {
            format!(
                "Set api.access_token in {} or {}",
                Config::default_path().display(),
                ACCESS_TOKEN_ENV
            )
        })
    }
}

fn display_results(console: &Console, results: &[TransactionResult]) {
    for result in results {
        let id = result.transaction_id();
        match result.status() {
            SyncStatus::Success if result.has_changes() => console.note(format!(
                "{}: {} ({})",
                id,
                counted(result.changes().len(), "change"),
                result.direction()
            )),
            SyncStatus::Success => {}
            SyncStatus::Error => {
                for message in result.errors() {
                    console.problem(format!("{}: {}", id, message));
                }
            }
            SyncStatus::Conflict => {
                for conflict in result.conflicts() {
                    console.caution(format!(
                        "{}: {} (kept {})",
                        id,
                        conflict.message(),
                        conflict.resolution()
                    ));
                }
            }
            SyncStatus::Warning | SyncStatus::Skipped => {
                for message in result.warnings() {
                    console.caution(message);
                }
            }
        }
    }
}

fn display_summary(console: &Console, summary: &SyncSummary) {
    let duration_ms = summary.duration().num_milliseconds();
    let duration_display = if duration_ms >= 1000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", duration_ms)
    };

    if summary.errors == 0 {
        console.done(format!(
            "{} completed in {}",
            if summary.dry_run { "Dry run" } else { "Sync" },
            duration_display
        ));
    }

    console.stat("Transactions", summary.total);
    console.stat("Successful", summary.successful);
    console.stat("Changes", summary.changes);
    console.stat("Pushed", summary.local_to_remote);
    console.stat("Pulled", summary.remote_to_local);
    for (label, count) in [
        ("Conflicts", summary.conflicts),
        ("Skipped", summary.skipped),
        ("Errors", summary.errors),
    ] {
        if count > 0 {
            console.stat(label, count);
        }
    }
    console.stat("Success rate", format!("{:.1}%", summary.success_rate()));
}
