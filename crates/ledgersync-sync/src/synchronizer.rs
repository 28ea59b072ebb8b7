//! Synchronization run orchestration
//!
//! The [`Synchronizer`] reconciles a local and a remote transaction set.
//!
//! ## Run Flow
//!
//! 1. **Validate**: both collections are checked by [`prepare_sync`]; an
//!    invalid report aborts the run before any side effect
//! 2. **Match**: records are paired by transaction id
//! 3. **Resolve**: each pair goes through the [`ResolutionEngine`], then
//!    locally authoritative values are written back and every applied
//!    write is appended to the changelog
//! 4. **Orphans**: records present on one side only become SKIPPED results
//! 5. **Summarize**: every result is folded into a [`SyncSummary`]
//!
//! Processing is strictly sequential. A failed write-back marks that one
//! result ERROR and the run continues.

use std::collections::HashSet;
use std::sync::Arc;

use ledgersync_conflict::{match_transactions_by_id, MatchResult, MatchedPair, ResolutionEngine};
use ledgersync_core::domain::{FieldRegistry, SyncSummary, TransactionResult};
use ledgersync_core::ports::{Changelog, FieldDiff, SyncReporter, TransactionWriter};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::validation::{prepare_sync, RecordSide};
use crate::SyncError;

/// Everything produced by one successful run
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Matched results in local input order, then local orphans, then remote orphans
    pub results: Vec<TransactionResult>,
    pub summary: SyncSummary,
}

/// Drives one synchronization run over its collaborators
pub struct Synchronizer {
    engine: ResolutionEngine,
    writer: Arc<dyn TransactionWriter>,
    changelog: Arc<dyn Changelog>,
    reporter: Arc<dyn SyncReporter>,
    dry_run: bool,
}

impl Synchronizer {
    /// Creates a synchronizer performing live write-backs
    pub fn new(
        engine: ResolutionEngine,
        writer: Arc<dyn TransactionWriter>,
        changelog: Arc<dyn Changelog>,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            engine,
            writer,
            changelog,
            reporter,
            dry_run: false,
        }
    }

    /// Resolves everything but neither writes upstream nor records changes
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn registry(&self) -> &FieldRegistry {
        self.engine.registry()
    }

    /// Reconciles the two collections
    ///
    /// # Errors
    /// Returns [`SyncError::Validation`] if either collection is malformed
    /// (nothing is written in that case) and [`SyncError::Run`] if matching
    /// produced an inconsistent partition.
    #[tracing::instrument(skip_all, fields(local = local.len(), remote = remote.len(), dry_run = self.dry_run))]
    pub async fn synchronize(&self, local: &[Value], remote: &[Value]) -> Result<SyncOutcome, SyncError> {
        let report = prepare_sync(local, remote, self.engine.registry());
        if !report.is_valid() {
            error!(issues = report.issues().len(), "Input validation failed, aborting run");
            return Err(SyncError::Validation(report));
        }

        let mut summary = SyncSummary::new(self.dry_run);
        self.reporter.log_sync_start(local.len() + remote.len(), self.dry_run);
        info!(run_id = %summary.run_id, "Starting synchronization run");

        let matches = match_transactions_by_id(local, remote);
        check_partition(&matches)?;

        let mut results =
            Vec::with_capacity(matches.matched.len() + matches.local_only.len() + matches.remote_only.len());

        for pair in &matches.matched {
            let result = self.process_pair(pair).await;
            results.push(result);
        }
        for orphan in &matches.local_only {
            results.push(self.orphan_result(&orphan.id, RecordSide::Local));
        }
        for orphan in &matches.remote_only {
            results.push(self.orphan_result(&orphan.id, RecordSide::Remote));
        }

        for result in &results {
            self.reporter.log_transaction_sync(result);
            for conflict in result.conflicts() {
                self.reporter.log_conflict(conflict);
            }
            summary.record(result);
        }
        summary.finish();

        info!(
            run_id = %summary.run_id,
            total = summary.total,
            successful = summary.successful,
            conflicts = summary.conflicts,
            errors = summary.errors,
            skipped = summary.skipped,
            duration_ms = summary.duration().num_milliseconds(),
            "Synchronization run complete"
        );
        self.reporter.log_sync_complete(&summary);

        Ok(SyncOutcome { results, summary })
    }

    /// Resolves one matched pair and pushes its write-back fields
    async fn process_pair(&self, pair: &MatchedPair) -> TransactionResult {
        let result = self.engine.resolve_transaction(&pair.local, &pair.remote, &pair.id);
        let updates = self.engine.get_write_back_fields(&result);
        if updates.is_empty() {
            return result;
        }

        debug!(
            transaction_id = %pair.id,
            fields = updates.len(),
            "Writing resolved fields back"
        );

        let message = match self.writer.update_transaction(&pair.id, &updates, self.dry_run).await {
            Ok(true) => {
                // Diffed against the remote record: a newer local edit records
                // no FieldChange, yet the remote copy still changed
                if !self.dry_run {
                    let diff: FieldDiff = updates
                        .iter()
                        .map(|(field, value)| {
                            let old = pair.remote.get(field).cloned().unwrap_or(Value::Null);
                            (field.clone(), (old, value.clone()))
                        })
                        .collect();
                    self.changelog.log_transaction_modify(&pair.id, &diff).await;
                }
                return result;
            }
            Ok(false) => format!(
                "Write-back for transaction {} was not applied by the remote system",
                pair.id
            ),
            Err(e) => format!("Write-back failed: {}", e),
        };

        error!(transaction_id = %pair.id, %message);
        self.reporter.log_error(&message, Some(&pair.id));

        let mut builder = result.into_builder();
        builder.error(message);
        builder.build()
    }

    fn orphan_result(&self, id: &str, side: RecordSide) -> TransactionResult {
        let message = format!(
            "Transaction {} exists only in {} data; no cross-side creation performed",
            id, side
        );
        warn!(transaction_id = %id, %side, "Orphan transaction skipped");
        self.reporter.log_warning(&message, Some(id));

        let mut builder = TransactionResult::builder(id);
        builder.warning(message).skipped();
        builder.build()
    }
}

/// Verifies that no id landed in more than one match group
fn check_partition(matches: &MatchResult) -> Result<(), SyncError> {
    let mut seen = HashSet::new();
    let ids = matches
        .matched
        .iter()
        .map(|p| p.id.as_str())
        .chain(matches.local_only.iter().map(|r| r.id.as_str()))
        .chain(matches.remote_only.iter().map(|r| r.id.as_str()));

    for id in ids {
        if !seen.insert(id) {
            return Err(SyncError::Run(format!(
                "transaction {} was assigned to more than one match group",
                id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_conflict::IdentifiedRecord;
    use serde_json::{json, Map};

    fn identified(id: &str) -> IdentifiedRecord {
        IdentifiedRecord {
            id: id.to_string(),
            record: Map::new(),
        }
    }

    #[test]
    fn test_check_partition_accepts_disjoint_groups() {
        let matches = MatchResult {
            matched: vec![MatchedPair {
                id: "1".to_string(),
                local: Map::new(),
                remote: Map::new(),
            }],
            local_only: vec![identified("2")],
            remote_only: vec![identified("3")],
        };
        assert!(check_partition(&matches).is_ok());
    }

    #[test]
    fn test_check_partition_rejects_overlap() {
        let matches = MatchResult {
            matched: Vec::new(),
            local_only: vec![identified("2")],
            remote_only: vec![identified("2")],
        };
        let err = check_partition(&matches).unwrap_err();
        assert!(matches!(err, SyncError::Run(ref m) if m.contains("transaction 2")));
    }

    #[test]
    fn test_matching_real_inputs_is_a_partition() {
        let local = vec![json!({"id": "1"}), json!({"id": "2"})];
        let remote = vec![json!({"id": "2"}), json!({"id": "3"})];
        assert!(check_partition(&match_transactions_by_id(&local, &remote)).is_ok());
    }
}
