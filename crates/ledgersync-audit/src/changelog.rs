//! JsonlChangelog - JSON-lines changelog writer
//!
//! Appends one [`ChangelogEntry`] per line to a file that is never rewritten.
//! All `Changelog` methods are non-fatal: write failures are logged via
//! `tracing::warn!` but never propagated, so a broken audit file cannot fail
//! a synchronization run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ledgersync_core::{
    domain::{extract_id, ChangelogAction, ChangelogEntry, TransactionRecord},
    ports::{Changelog, FieldDiff},
};
use serde_json::{json, Map, Value};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Changelog adapter backed by an append-only JSON-lines file.
pub struct JsonlChangelog {
    path: PathBuf,
    /// Serializes appends so lines from concurrent callers never interleave
    write_lock: Mutex<()>,
}

impl JsonlChangelog {
    /// Creates a changelog writing to `path`.
    ///
    /// The file and its parent directories are created on the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the changelog file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, swallowing errors with a tracing warning.
    async fn append(&self, entry: &ChangelogEntry) {
        if let Err(e) = self.try_append(entry).await {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                transaction_id = %entry.transaction_id(),
                "Failed to append changelog entry"
            );
        }
    }

    async fn try_append(&self, entry: &ChangelogEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry).context("Failed to serialize changelog entry")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            action = %entry.action(),
            transaction_id = %entry.transaction_id(),
            "Changelog entry appended"
        );
        Ok(())
    }

    /// Reads back every entry in file order.
    ///
    /// A missing file yields no entries. Lines that do not parse are skipped
    /// with a warning.
    pub async fn read_entries(&self) -> anyhow::Result<Vec<ChangelogEntry>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ChangelogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(line = index + 1, error = %e, "Skipping malformed changelog line"),
            }
        }
        Ok(entries)
    }
}

/// Renders a field diff as `{field: {"old": .., "new": ..}}`
fn diff_details(diff: &FieldDiff) -> Value {
    let fields: Map<String, Value> = diff
        .iter()
        .map(|(field, (old, new))| (field.clone(), json!({ "old": old, "new": new })))
        .collect();
    Value::Object(fields)
}

#[async_trait::async_trait]
impl Changelog for JsonlChangelog {
    async fn log_transaction_modify(&self, id: &str, diff: &FieldDiff) {
        let entry = ChangelogEntry::new(ChangelogAction::TransactionModify, id)
            .with_details(diff_details(diff));
        self.append(&entry).await;
    }

    async fn log_transaction_create(&self, record: &TransactionRecord) {
        let id = extract_id(record).unwrap_or_default();
        let entry = ChangelogEntry::new(ChangelogAction::TransactionCreate, id)
            .with_details(Value::Object(record.clone()));
        self.append(&entry).await;
    }

    async fn log_transaction_delete(&self, id: &str) {
        let entry = ChangelogEntry::new(ChangelogAction::TransactionDelete, id);
        self.append(&entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_details_shape() {
        let mut diff = FieldDiff::new();
        diff.insert("note".to_string(), (json!("old"), json!("new")));
        diff.insert("labels".to_string(), (json!(["a"]), json!(["a", "b"])));

        assert_eq!(
            diff_details(&diff),
            json!({
                "labels": {"old": ["a"], "new": ["a", "b"]},
                "note": {"old": "old", "new": "new"}
            })
        );
    }

    #[test]
    fn test_empty_diff_renders_empty_object() {
        assert_eq!(diff_details(&FieldDiff::new()), json!({}));
    }
}
