//! Run reporting port
//!
//! Purely observational: the synchronizer never consults anything a
//! reporter does, so every method returns `()`.

use crate::domain::conflict::Conflict;
use crate::domain::result::TransactionResult;
use crate::domain::summary::SyncSummary;

/// Port trait for presenting synchronization progress
pub trait SyncReporter: Send + Sync {
    /// A run is about to process `count` input records
    fn log_sync_start(&self, count: usize, dry_run: bool);

    /// One transaction has been processed
    fn log_transaction_sync(&self, result: &TransactionResult);

    /// A conflict was recorded on a processed transaction
    fn log_conflict(&self, conflict: &Conflict);

    /// The run finished
    fn log_sync_complete(&self, summary: &SyncSummary);

    fn log_error(&self, message: &str, transaction_id: Option<&str>);

    fn log_warning(&self, message: &str, transaction_id: Option<&str>);
}
