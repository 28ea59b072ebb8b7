//! LedgerSync Sync - Transaction set synchronization
//!
//! Provides:
//! - Schema validation of both input collections before any side effect
//! - Id-based matching and per-pair resolution
//! - Write-back of locally authoritative values and changelog recording
//! - Run summaries reported through the `SyncReporter` port
//!
//! ## Modules
//!
//! - [`synchronizer`] - Sequential orchestration of one synchronization run
//! - [`validation`] - Input schema checks producing a [`ValidationReport`]
//! - [`reporter`] - `SyncReporter` adapter over `tracing`

pub mod reporter;
pub mod synchronizer;
pub mod validation;

use thiserror::Error;

pub use reporter::TracingSyncReporter;
pub use synchronizer::{SyncOutcome, Synchronizer};
pub use validation::{prepare_sync, RecordSide, ValidationIssue, ValidationReport};

/// Errors that abort a whole synchronization run
///
/// Per-field and per-transaction failures never surface here; they are
/// recorded on the affected `TransactionResult`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The input collections are malformed; nothing was processed
    #[error("Input validation failed: {0}")]
    Validation(ValidationReport),

    /// An unexpected orchestration failure; the run produced no usable results
    #[error("Synchronization run failed: {0}")]
    Run(String),
}
