//! Changelog entries
//!
//! One entry is appended per mutated transaction. Entries are written as
//! JSON lines by the changelog adapter and read back for inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mutations that can be recorded in the changelog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangelogAction {
    /// Fields of an existing transaction were modified
    TransactionModify,
    /// A transaction was created
    TransactionCreate,
    /// A transaction was deleted
    TransactionDelete,
}

impl std::fmt::Display for ChangelogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangelogAction::TransactionModify => "transaction_modify",
            ChangelogAction::TransactionCreate => "transaction_create",
            ChangelogAction::TransactionDelete => "transaction_delete",
        };
        write!(f, "{}", s)
    }
}

/// One appended changelog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    timestamp: DateTime<Utc>,
    action: ChangelogAction,
    transaction_id: String,
    /// Action-specific payload (field diffs, the created record, ...)
    #[serde(default)]
    details: Value,
}

impl ChangelogEntry {
    /// Creates an entry stamped with the current time
    pub fn new(action: ChangelogAction, transaction_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            transaction_id: transaction_id.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn action(&self) -> ChangelogAction {
        self.action
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn details(&self) -> &Value {
        &self.details
    }
}
