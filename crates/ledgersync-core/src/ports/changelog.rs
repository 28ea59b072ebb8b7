//! Changelog port (driven/secondary port)
//!
//! Append-only audit trail of transaction mutations. The synchronizer calls
//! it once per successfully written transaction and never during a dry run.
//! Implementations log their own failures instead of returning them, so a
//! broken audit sink never fails a synchronization run.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::transaction::TransactionRecord;

/// Field name to `(old, new)` value pair
pub type FieldDiff = BTreeMap<String, (Value, Value)>;

/// Port trait for recording transaction mutations
#[async_trait::async_trait]
pub trait Changelog: Send + Sync {
    /// Records the modified fields of one transaction
    async fn log_transaction_modify(&self, id: &str, diff: &FieldDiff);

    /// Records a newly created transaction
    async fn log_transaction_create(&self, record: &TransactionRecord);

    /// Records a deleted transaction
    async fn log_transaction_delete(&self, id: &str);
}
