//! Run summary

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{SyncStatus, TransactionResult};

/// Aggregate counts for one synchronization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Unique id of the run
    pub run_id: Uuid,
    /// Number of results folded in (matched and orphaned)
    pub total: u32,
    /// Results that completed, with or without warnings
    pub successful: u32,
    /// Results with at least one conflict
    pub conflicts: u32,
    /// Results that ended in error
    pub errors: u32,
    /// Results carrying at least one warning
    pub warnings: u32,
    /// Orphans that were not processed
    pub skipped: u32,
    /// Field changes across all results
    pub changes: u32,
    /// Results whose resolved values were pushed upstream
    pub local_to_remote: u32,
    /// Results that adopted remote values
    pub remote_to_local: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
}

impl SyncSummary {
    /// Opens a summary for a new run
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total: 0,
            successful: 0,
            conflicts: 0,
            errors: 0,
            warnings: 0,
            skipped: 0,
            changes: 0,
            local_to_remote: 0,
            remote_to_local: 0,
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
        }
    }

    /// Folds one transaction result into the counts
    pub fn record(&mut self, result: &TransactionResult) {
        self.total += 1;
        match result.status() {
            SyncStatus::Success | SyncStatus::Warning => self.successful += 1,
            SyncStatus::Conflict => self.conflicts += 1,
            SyncStatus::Error => self.errors += 1,
            SyncStatus::Skipped => self.skipped += 1,
        }
        if result.has_warnings() {
            self.warnings += 1;
        }
        self.changes += result.changes().len() as u32;
        let direction = result.direction();
        if direction.pushes() && result.status() != SyncStatus::Error {
            self.local_to_remote += 1;
        }
        if direction.pulls() {
            self.remote_to_local += 1;
        }
    }

    /// Closes the run
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Elapsed time of the run (up to now while still open)
    pub fn duration(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Share of successful results as a percentage, 0 for an empty run
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.successful) / f64::from(self.total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::SyncDirection;

    #[test]
    fn test_empty_summary() {
        let summary = SyncSummary::new(true);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate(), 0.0);
        assert!(summary.dry_run);
        assert!(summary.finished_at.is_none());
    }

    #[test]
    fn test_record_counts() {
        let mut summary = SyncSummary::new(false);

        let ok = TransactionResult::builder("1")
            .direction(SyncDirection::LocalToRemote)
            .build();
        let warned = TransactionResult::builder("2")
            .warning("drift")
            .direction(SyncDirection::RemoteToLocal)
            .build();
        let failed = TransactionResult::builder("3")
            .error("boom")
            .direction(SyncDirection::LocalToRemote)
            .build();
        let orphan = TransactionResult::builder("4")
            .warning("orphan")
            .skipped()
            .build();

        for result in [&ok, &warned, &failed, &orphan] {
            summary.record(result);
        }
        summary.finish();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.local_to_remote, 1);
        assert_eq!(summary.remote_to_local, 1);
        assert_eq!(summary.success_rate(), 50.0);
        assert!(summary.finished_at.is_some());
        assert!(summary.duration() >= Duration::zero());
    }
}
