//! Per-transaction synchronization results
//!
//! A [`TransactionResult`] is assembled through a [`TransactionResultBuilder`]
//! by one processing step and is read-only once built. A later step that
//! needs to amend it (for example after a failed write-back) reopens it with
//! [`TransactionResult::into_builder`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::change::FieldChange;
use super::conflict::Conflict;

/// Outcome of synchronizing one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Conflict,
    Error,
    Skipped,
    Warning,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Success => "success",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Error => "error",
            SyncStatus::Skipped => "skipped",
            SyncStatus::Warning => "warning",
        };
        write!(f, "{}", s)
    }
}

/// Which way resolved values flow for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Local values are pushed to the remote system
    LocalToRemote,
    /// Remote values replace local ones
    RemoteToLocal,
    Bidirectional,
    None,
}

impl SyncDirection {
    /// Combines the push and pull flags of one transaction
    pub fn from_flows(push: bool, pull: bool) -> Self {
        match (push, pull) {
            (true, true) => SyncDirection::Bidirectional,
            (true, false) => SyncDirection::LocalToRemote,
            (false, true) => SyncDirection::RemoteToLocal,
            (false, false) => SyncDirection::None,
        }
    }

    pub fn pushes(&self) -> bool {
        matches!(
            self,
            SyncDirection::LocalToRemote | SyncDirection::Bidirectional
        )
    }

    pub fn pulls(&self) -> bool {
        matches!(
            self,
            SyncDirection::RemoteToLocal | SyncDirection::Bidirectional
        )
    }
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncDirection::LocalToRemote => "local_to_remote",
            SyncDirection::RemoteToLocal => "remote_to_local",
            SyncDirection::Bidirectional => "bidirectional",
            SyncDirection::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Everything learned while processing one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    transaction_id: String,
    status: SyncStatus,
    changes: Vec<FieldChange>,
    conflicts: Vec<Conflict>,
    errors: Vec<String>,
    warnings: Vec<String>,
    direction: SyncDirection,
    timestamp: DateTime<Utc>,
    resolved_fields: Map<String, Value>,
    write_back_fields: BTreeMap<String, bool>,
}

impl TransactionResult {
    /// Starts a result for the given transaction
    pub fn builder(transaction_id: impl Into<String>) -> TransactionResultBuilder {
        TransactionResultBuilder::new(transaction_id)
    }

    /// Reopens the result for amendment
    pub fn into_builder(self) -> TransactionResultBuilder {
        TransactionResultBuilder {
            skipped: self.status == SyncStatus::Skipped,
            result: self,
        }
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Resolved value of every processed field
    pub fn resolved_fields(&self) -> &Map<String, Value> {
        &self.resolved_fields
    }

    /// Write-back flag of every processed field
    pub fn write_back_fields(&self) -> &BTreeMap<String, bool> {
        &self.write_back_fields
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Mutable stage of a [`TransactionResult`]
///
/// The status is derived on [`build`](Self::build): error beats conflict,
/// conflict beats warning, and warning beats success. A result marked
/// [`skipped`](Self::skipped) stays skipped.
#[derive(Debug, Clone)]
pub struct TransactionResultBuilder {
    result: TransactionResult,
    skipped: bool,
}

impl TransactionResultBuilder {
    fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            result: TransactionResult {
                transaction_id: transaction_id.into(),
                status: SyncStatus::Success,
                changes: Vec::new(),
                conflicts: Vec::new(),
                errors: Vec::new(),
                warnings: Vec::new(),
                direction: SyncDirection::None,
                timestamp: Utc::now(),
                resolved_fields: Map::new(),
                write_back_fields: BTreeMap::new(),
            },
            skipped: false,
        }
    }

    pub fn change(&mut self, change: FieldChange) -> &mut Self {
        self.result.changes.push(change);
        self
    }

    pub fn conflict(&mut self, conflict: Conflict) -> &mut Self {
        self.result.conflicts.push(conflict);
        self
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.result.errors.push(message.into());
        self
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.result.warnings.push(message.into());
        self
    }

    /// Records the resolved value and write-back flag of one field
    pub fn resolved(&mut self, field: impl Into<String>, value: Value, write_back: bool) -> &mut Self {
        let field = field.into();
        self.result.write_back_fields.insert(field.clone(), write_back);
        self.result.resolved_fields.insert(field, value);
        self
    }

    pub fn direction(&mut self, direction: SyncDirection) -> &mut Self {
        self.result.direction = direction;
        self
    }

    /// Marks the transaction as not processed
    pub fn skipped(&mut self) -> &mut Self {
        self.skipped = true;
        self
    }

    pub fn build(&mut self) -> TransactionResult {
        let mut result = self.result.clone();
        result.status = if self.skipped {
            SyncStatus::Skipped
        } else if result.has_errors() {
            SyncStatus::Error
        } else if result.has_conflicts() {
            SyncStatus::Conflict
        } else if result.has_warnings() {
            SyncStatus::Warning
        } else {
            SyncStatus::Success
        };
        result
    }
}
