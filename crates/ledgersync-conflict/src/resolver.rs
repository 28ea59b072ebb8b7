//! Per-transaction resolution engine
//!
//! Runs every registered field of a matched pair through its strategy's
//! resolver and assembles the [`TransactionResult`]. Failures of one field
//! are recorded on the result and never stop the remaining fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgersync_core::domain::{
    ChangeType, Conflict, FieldChange, FieldRegistry, ResolutionStrategy, SyncDirection,
    TransactionRecord, TransactionResult, TransactionView, ID_FIELDS,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::comparator::TransactionComparator;
use crate::error::ResolutionError;
use crate::normalize::equivalent;
use crate::strategy::{Resolved, ResolverTable};

/// Everything decided about one field
struct FieldOutcome {
    resolved: Resolved,
    write_back: bool,
    change: Option<FieldChange>,
    conflict: Option<Conflict>,
    /// The local side has to adopt a value it does not hold
    pulls: bool,
}

/// Resolves matched transaction pairs field by field
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    registry: Arc<FieldRegistry>,
    comparator: TransactionComparator,
    resolvers: ResolverTable,
}

impl ResolutionEngine {
    /// Creates an engine over the given field registry
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self {
            comparator: TransactionComparator::new(Arc::clone(&registry)),
            resolvers: ResolverTable::new(Arc::clone(&registry)),
            registry,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn comparator(&self) -> &TransactionComparator {
        &self.comparator
    }

    /// Resolves one matched pair
    ///
    /// Unmapped fields are skipped with one warning each. The result status
    /// is ERROR if any field failed, CONFLICT if any conflict was recorded,
    /// WARNING if any warning was raised, and SUCCESS otherwise.
    pub fn resolve_transaction(
        &self,
        local: &TransactionRecord,
        remote: &TransactionRecord,
        id: &str,
    ) -> TransactionResult {
        let mut builder = TransactionResult::builder(id);

        let view = match TransactionView::new(id, local.clone(), remote.clone()) {
            Ok(view) => view,
            Err(e) => {
                builder.error(e.to_string());
                return builder.build();
            }
        };

        let fields: Vec<String> = view.field_names().into_iter().map(String::from).collect();
        let unmapped = self
            .registry
            .validate_field_coverage(fields.iter().map(String::as_str));
        for field in &unmapped {
            warn!(transaction_id = %id, field = %field, "No resolution strategy for field");
            builder.warning(format!(
                "Field '{}' has no resolution strategy and was not synchronized",
                field
            ));
        }

        let local_ts = view.local_modified();
        let remote_ts = view.remote_modified();
        let mut pushes = false;
        let mut pulls = false;

        for field in fields.iter().filter(|f| !unmapped.contains(*f)) {
            match self.resolve_field(&view, field, local_ts, remote_ts) {
                Ok(outcome) => {
                    debug!(
                        transaction_id = %id,
                        field = %field,
                        write_back = outcome.write_back,
                        changed = outcome.change.is_some(),
                        "Resolved field"
                    );
                    if let Some(warning) = outcome.resolved.warning {
                        builder.warning(warning);
                    }
                    if let Some(change) = outcome.change {
                        builder.change(change);
                    }
                    if let Some(conflict) = outcome.conflict {
                        builder.conflict(conflict);
                    }
                    pushes |= outcome.write_back;
                    pulls |= outcome.pulls;
                    builder.resolved(field.as_str(), outcome.resolved.value, outcome.write_back);
                }
                Err(e) => {
                    warn!(transaction_id = %id, field = %field, error = %e, "Failed to resolve field");
                    builder.error(format!("Failed to resolve field '{}': {}", field, e));
                }
            }
        }

        builder.direction(SyncDirection::from_flows(pushes, pulls));
        builder.build()
    }

    fn resolve_field(
        &self,
        view: &TransactionView,
        field: &str,
        local_ts: Option<DateTime<Utc>>,
        remote_ts: Option<DateTime<Utc>>,
    ) -> Result<FieldOutcome, ResolutionError> {
        let strategy = self.registry.get_strategy(field)?;
        let resolver = self.resolvers.get(strategy);
        let local = view.local_value(field);
        let remote = view.remote_value(field);

        let resolved = resolver.resolve(view, field, local, remote, local_ts, remote_ts)?;
        let write_back = resolver.should_write_back(view, field, &resolved.value, remote);

        let change_type = self
            .comparator
            .classify_field(field, local, remote, local_ts, remote_ts);
        let old = if change_type == ChangeType::LocalOnly {
            local
        } else {
            remote
        };

        // Identity is settled by matching, so id fields never record a change
        let mut change = None;
        let mut pulls = false;
        if !ID_FIELDS.contains(&field)
            && !equivalent(&self.registry, field, Some(&resolved.value), old)
        {
            change = Some(FieldChange::new(
                field,
                old.cloned().unwrap_or(Value::Null),
                resolved.value.clone(),
                change_type,
                strategy,
            )?);
            pulls = !equivalent(&self.registry, field, Some(&resolved.value), local);
        }

        let conflict = self.detect_conflict(view, field, strategy, &resolved.value, local_ts, remote_ts);

        Ok(FieldOutcome {
            resolved,
            write_back,
            change,
            conflict,
            pulls,
        })
    }

    /// Both sides changed the field at the same known instant and the
    /// strategy throws one of the values away
    fn detect_conflict(
        &self,
        view: &TransactionView,
        field: &str,
        strategy: ResolutionStrategy,
        resolved: &Value,
        local_ts: Option<DateTime<Utc>>,
        remote_ts: Option<DateTime<Utc>>,
    ) -> Option<Conflict> {
        let discards_a_side = matches!(
            strategy,
            ResolutionStrategy::LocalChangesOnly | ResolutionStrategy::RemoteWins
        );
        let same_instant = matches!((local_ts, remote_ts), (Some(l), Some(r)) if l == r);
        let local = view.local_value(field);
        let remote = view.remote_value(field);

        if !discards_a_side || !same_instant || equivalent(&self.registry, field, local, remote) {
            return None;
        }

        warn!(
            transaction_id = %view.id(),
            field = %field,
            strategy = %strategy,
            "Concurrent edits, resolved by policy"
        );
        Some(
            Conflict::new(
                view.id(),
                field,
                local.cloned().unwrap_or(Value::Null),
                remote.cloned().unwrap_or(Value::Null),
                strategy,
                resolved.clone(),
            )
            .with_timestamps(local_ts, remote_ts),
        )
    }

    /// Resolved values of the fields that need pushing upstream
    pub fn get_write_back_fields(&self, result: &TransactionResult) -> Map<String, Value> {
        result
            .resolved_fields()
            .iter()
            .filter(|(field, _)| {
                result
                    .write_back_fields()
                    .get(field.as_str())
                    .copied()
                    .unwrap_or(false)
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}
