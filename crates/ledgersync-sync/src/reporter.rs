//! `SyncReporter` adapter emitting tracing events
//!
//! Used by the CLI for human-readable progress. Per-transaction events are
//! logged at `debug` unless the result needs attention.

use ledgersync_core::domain::{Conflict, SyncStatus, SyncSummary, TransactionResult};
use ledgersync_core::ports::SyncReporter;
use tracing::{debug, error, info, warn};

/// Reports run progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSyncReporter;

impl TracingSyncReporter {
    pub fn new() -> Self {
        Self
    }
}

impl SyncReporter for TracingSyncReporter {
    fn log_sync_start(&self, count: usize, dry_run: bool) {
        info!(records = count, dry_run, "Synchronization started");
    }

    fn log_transaction_sync(&self, result: &TransactionResult) {
        let id = result.transaction_id();
        let status = result.status();
        match status {
            SyncStatus::Success => debug!(
                transaction_id = %id,
                changes = result.changes().len(),
                direction = %result.direction(),
                "Transaction synchronized"
            ),
            SyncStatus::Skipped => info!(transaction_id = %id, "Transaction skipped"),
            SyncStatus::Warning | SyncStatus::Conflict => {
                for message in result.warnings() {
                    warn!(transaction_id = %id, %status, "{}", message);
                }
            }
            SyncStatus::Error => {
                for message in result.errors() {
                    error!(transaction_id = %id, "{}", message);
                }
            }
        }
    }

    fn log_conflict(&self, conflict: &Conflict) {
        warn!(
            transaction_id = %conflict.transaction_id(),
            field = %conflict.field(),
            strategy = %conflict.strategy(),
            local = %conflict.local_value(),
            remote = %conflict.remote_value(),
            resolution = %conflict.resolution(),
            "{}",
            conflict.message()
        );
    }

    fn log_sync_complete(&self, summary: &SyncSummary) {
        info!(
            run_id = %summary.run_id,
            total = summary.total,
            successful = summary.successful,
            conflicts = summary.conflicts,
            errors = summary.errors,
            warnings = summary.warnings,
            skipped = summary.skipped,
            changes = summary.changes,
            local_to_remote = summary.local_to_remote,
            remote_to_local = summary.remote_to_local,
            success_rate = summary.success_rate(),
            dry_run = summary.dry_run,
            "Synchronization finished"
        );
    }

    fn log_error(&self, message: &str, transaction_id: Option<&str>) {
        match transaction_id {
            Some(id) => error!(transaction_id = %id, "{}", message),
            None => error!("{}", message),
        }
    }

    fn log_warning(&self, message: &str, transaction_id: Option<&str>) {
        match transaction_id {
            Some(id) => warn!(transaction_id = %id, "{}", message),
            None => warn!("{}", message),
        }
    }
}
