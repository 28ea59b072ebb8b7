//! Input schema validation
//!
//! [`prepare_sync`] inspects both collections and returns a typed
//! [`ValidationReport`]. It never fails itself; callers decide whether an
//! invalid report aborts the run.

use std::collections::BTreeSet;

use ledgersync_core::domain::{extract_id, FieldRegistry};
use serde::Serialize;
use serde_json::Value;

/// Fields every remote record must carry with a non-null value
pub const REQUIRED_REMOTE_FIELDS: [&str; 2] = ["amount", "date"];

/// Which input collection a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSide {
    Local,
    Remote,
}

impl std::fmt::Display for RecordSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordSide::Local => "local",
            RecordSide::Remote => "remote",
        };
        write!(f, "{}", s)
    }
}

/// One schema problem found in an input record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub side: RecordSide,
    /// Position of the record in its input collection
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} record {}: {}", self.side, self.index, self.message)
    }
}

/// Outcome of validating both input collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    local_count: usize,
    remote_count: usize,
    issues: Vec<ValidationIssue>,
    /// Field names seen in the inputs that have no registered strategy
    unmapped_fields: BTreeSet<String>,
}

impl ValidationReport {
    /// Returns true when no record has a schema problem
    ///
    /// Unmapped fields do not make a report invalid.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn unmapped_fields(&self) -> &BTreeSet<String> {
        &self.unmapped_fields
    }

    pub fn local_count(&self) -> usize {
        self.local_count
    }

    pub fn remote_count(&self) -> usize {
        self.remote_count
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(
                f,
                "{} local and {} remote records are valid",
                self.local_count, self.remote_count
            );
        }
        let details: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{} invalid record(s): {}", self.issues.len(), details.join("; "))
    }
}

/// Checks that both collections are shaped like transaction sets
///
/// Every record must be a JSON object with an extractable id. Remote
/// records must also carry non-null `amount` and `date` values.
pub fn prepare_sync(local: &[Value], remote: &[Value], registry: &FieldRegistry) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen_fields = BTreeSet::new();

    for (side, records) in [(RecordSide::Local, local), (RecordSide::Remote, remote)] {
        for (index, value) in records.iter().enumerate() {
            let mut issue = |message: String| {
                issues.push(ValidationIssue {
                    side,
                    index,
                    message,
                })
            };

            let Some(record) = value.as_object() else {
                issue("record is not a JSON object".to_string());
                continue;
            };
            seen_fields.extend(record.keys().cloned());

            if extract_id(record).is_none() {
                issue("record has no transaction id".to_string());
            }
            if side == RecordSide::Remote {
                for field in REQUIRED_REMOTE_FIELDS {
                    if record.get(field).map_or(true, Value::is_null) {
                        issue(format!("missing required field '{}'", field));
                    }
                }
            }
        }
    }

    let unmapped_fields = registry.validate_field_coverage(seen_fields.iter().map(String::as_str));
    if !unmapped_fields.is_empty() {
        tracing::debug!(fields = ?unmapped_fields, "Inputs carry unmapped fields");
    }

    ValidationReport {
        local_count: local.len(),
        remote_count: remote.len(),
        issues,
        unmapped_fields,
    }
}
