//! Change detection and transaction matching
//!
//! The change kind computed here is audit metadata. It picks the "old" side
//! of a recorded change but never selects which resolver runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgersync_core::domain::{
    extract_id, extract_modified_at, ChangeType, FieldChange, FieldRegistry, TransactionRecord,
    ID_FIELDS,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalize::equivalent;

/// Detects field-level differences between two records of one transaction
#[derive(Debug, Clone)]
pub struct TransactionComparator {
    registry: Arc<FieldRegistry>,
}

impl TransactionComparator {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self { registry }
    }

    /// Classifies how one field differs between the two sides
    ///
    /// Rules, first match wins:
    /// 1. equal after normalization: `NoChange`
    /// 2. timestamp-valued field: `RemoteOnly`
    /// 3. immutable field: `RemoteOnly` (drift is logged)
    /// 4. both timestamps known and unequal: `LocalOnly` if local is newer,
    ///    otherwise `RemoteOnly`
    /// 5. anything else: `BothChanged`
    pub fn classify_field(
        &self,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        local_ts: Option<DateTime<Utc>>,
        remote_ts: Option<DateTime<Utc>>,
    ) -> ChangeType {
        if equivalent(&self.registry, field, local, remote) {
            return ChangeType::NoChange;
        }
        if self.registry.is_timestamp_field(field) {
            return ChangeType::RemoteOnly;
        }
        if self.registry.is_immutable(field) {
            if local.is_some() && !ID_FIELDS.contains(&field) {
                warn!(field = %field, "Immutable field differs between local and remote");
            }
            return ChangeType::RemoteOnly;
        }
        match (local_ts, remote_ts) {
            (Some(l), Some(r)) if l > r => ChangeType::LocalOnly,
            (Some(l), Some(r)) if l < r => ChangeType::RemoteOnly,
            _ => ChangeType::BothChanged,
        }
    }

    /// Lists the registered fields that differ, in field-name order
    ///
    /// Each change points from the side considered stale to the side that
    /// changed: `LocalOnly` changes go remote to local, all others go local
    /// to remote. Unmapped fields are left out.
    pub fn compare_transactions(
        &self,
        local: &TransactionRecord,
        remote: &TransactionRecord,
    ) -> Vec<FieldChange> {
        let local_ts = extract_modified_at(local);
        let remote_ts = extract_modified_at(remote);

        let mut fields: Vec<&String> = local.keys().chain(remote.keys()).collect();
        fields.sort_unstable();
        fields.dedup();

        let mut changes = Vec::new();
        for field in fields {
            let Ok(strategy) = self.registry.get_strategy(field) else {
                continue;
            };
            let l = local.get(field.as_str());
            let r = remote.get(field.as_str());
            let change_type = self.classify_field(field, l, r, local_ts, remote_ts);
            if change_type == ChangeType::NoChange {
                continue;
            }

            let (old, new) = if change_type == ChangeType::LocalOnly {
                (r, l)
            } else {
                (l, r)
            };
            let old = old.cloned().unwrap_or(Value::Null);
            let new = new.cloned().unwrap_or(Value::Null);
            match FieldChange::new(field.as_str(), old, new, change_type, strategy) {
                Ok(change) => changes.push(change),
                Err(e) => debug!(field = %field, error = %e, "Skipping field"),
            }
        }
        changes
    }
}

/// A record paired with its extracted id
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedRecord {
    pub id: String,
    pub record: TransactionRecord,
}

/// Local and remote records sharing one id
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub id: String,
    pub local: TransactionRecord,
    pub remote: TransactionRecord,
}

/// Partition of two record collections by id
///
/// The three groups are disjoint and together cover every input record
/// that carried a usable id. Each group follows its input's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub matched: Vec<MatchedPair>,
    pub local_only: Vec<IdentifiedRecord>,
    pub remote_only: Vec<IdentifiedRecord>,
}

fn identify(records: &[Value], side: &str) -> Vec<IdentifiedRecord> {
    let mut seen = HashSet::new();
    let mut identified = Vec::with_capacity(records.len());

    for (index, value) in records.iter().enumerate() {
        let Some(record) = value.as_object() else {
            warn!(side, index, "Dropping record that is not an object");
            continue;
        };
        let Some(id) = extract_id(record) else {
            warn!(side, index, "Dropping record without an id");
            continue;
        };
        if !seen.insert(id.clone()) {
            warn!(side, index, transaction_id = %id, "Dropping duplicate record");
            continue;
        }
        identified.push(IdentifiedRecord {
            id,
            record: record.clone(),
        });
    }
    identified
}

/// Pairs local and remote records by their extracted id
pub fn match_transactions_by_id(local: &[Value], remote: &[Value]) -> MatchResult {
    let local = identify(local, "local");
    let remote = identify(remote, "remote");

    let local_ids: HashSet<&str> = local.iter().map(|r| r.id.as_str()).collect();
    let mut remote_by_id: HashMap<&str, &IdentifiedRecord> =
        remote.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut result = MatchResult::default();
    for entry in &local {
        match remote_by_id.remove(entry.id.as_str()) {
            Some(other) => result.matched.push(MatchedPair {
                id: entry.id.clone(),
                local: entry.record.clone(),
                remote: other.record.clone(),
            }),
            None => result.local_only.push(entry.clone()),
        }
    }
    result.remote_only = remote
        .iter()
        .filter(|r| !local_ids.contains(r.id.as_str()))
        .cloned()
        .collect();

    debug!(
        matched = result.matched.len(),
        local_only = result.local_only.len(),
        remote_only = result.remote_only.len(),
        "Matched transactions by id"
    );
    result
}
