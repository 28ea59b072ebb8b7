//! Write-back port (driven/secondary port)
//!
//! Pushes resolved field values to the remote system of record. The only
//! shipped adapter is the HTTP client in `ledgersync-api`.
//!
//! ## Design Notes
//!
//! - `validate_update_data` is a pure precondition check; adapters must call
//!   it before any network I/O in `update_transaction`.
//! - Under `dry_run` the adapter validates but performs no request.
//! - Batch outcomes are independent: one failed item does not stop the rest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::WriteBackError;

/// One item of a batch update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub id: String,
    pub updates: Map<String, Value>,
}

impl TransactionUpdate {
    pub fn new(id: impl Into<String>, updates: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            updates,
        }
    }
}

/// Port trait for pushing field updates upstream
#[async_trait::async_trait]
pub trait TransactionWriter: Send + Sync {
    /// Updates the given fields of one remote transaction
    ///
    /// Returns the remote system's success flag. Dry runs return `Ok(true)`
    /// after validation without contacting the remote system.
    ///
    /// # Errors
    /// Returns a [`WriteBackError`] on invalid payloads, transport failures,
    /// non-2xx responses, or a rate limit that persists after one retry.
    async fn update_transaction(
        &self,
        id: &str,
        updates: &Map<String, Value>,
        dry_run: bool,
    ) -> Result<bool, WriteBackError>;

    /// Applies several updates, one outcome per item in input order
    async fn batch_update_transactions(
        &self,
        updates: &[TransactionUpdate],
        dry_run: bool,
    ) -> Vec<bool>;

    /// Checks that every key is a registered writable field and every value
    /// is well-formed, without performing I/O
    fn validate_update_data(
        &self,
        id: &str,
        updates: &Map<String, Value>,
    ) -> Result<(), WriteBackError>;
}
