//! Field conflict records
//!
//! A conflict is recorded when both sides changed the same field at the same
//! known instant and the field's strategy discards one of the two values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::result::SyncStatus;
use super::strategy::ResolutionStrategy;

/// A divergent field whose winner was chosen by policy rather than recency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    transaction_id: String,
    field: String,
    local_value: Value,
    remote_value: Value,
    local_timestamp: Option<DateTime<Utc>>,
    remote_timestamp: Option<DateTime<Utc>>,
    strategy: ResolutionStrategy,
    /// The value the strategy settled on
    resolution: Value,
    status: SyncStatus,
    message: String,
}

impl Conflict {
    /// Creates a conflict with the default message
    pub fn new(
        transaction_id: impl Into<String>,
        field: impl Into<String>,
        local_value: Value,
        remote_value: Value,
        strategy: ResolutionStrategy,
        resolution: Value,
    ) -> Self {
        let transaction_id = transaction_id.into();
        let field = field.into();
        let message = format!(
            "Conflict in field '{}' for transaction {}",
            field, transaction_id
        );
        Self {
            transaction_id,
            field,
            local_value,
            remote_value,
            local_timestamp: None,
            remote_timestamp: None,
            strategy,
            resolution,
            status: SyncStatus::Conflict,
            message,
        }
    }

    /// Attaches the modification timestamps of both sides
    pub fn with_timestamps(
        mut self,
        local: Option<DateTime<Utc>>,
        remote: Option<DateTime<Utc>>,
    ) -> Self {
        self.local_timestamp = local;
        self.remote_timestamp = remote;
        self
    }

    /// Replaces the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn local_value(&self) -> &Value {
        &self.local_value
    }

    pub fn remote_value(&self) -> &Value {
        &self.remote_value
    }

    pub fn local_timestamp(&self) -> Option<DateTime<Utc>> {
        self.local_timestamp
    }

    pub fn remote_timestamp(&self) -> Option<DateTime<Utc>> {
        self.remote_timestamp
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn resolution(&self) -> &Value {
        &self.resolution
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conflict_default_message() {
        let conflict = Conflict::new(
            "17",
            "category",
            json!("Food"),
            json!("Dining"),
            ResolutionStrategy::RemoteWins,
            json!("Dining"),
        );
        assert_eq!(
            conflict.message(),
            "Conflict in field 'category' for transaction 17"
        );
        assert_eq!(conflict.status(), SyncStatus::Conflict);
        assert!(conflict.local_timestamp().is_none());
    }

    #[test]
    fn test_conflict_builders() {
        let ts = Utc::now();
        let conflict = Conflict::new(
            "1",
            "note",
            json!("a"),
            json!("b"),
            ResolutionStrategy::LocalChangesOnly,
            json!("a"),
        )
        .with_timestamps(Some(ts), Some(ts))
        .with_message("custom");

        assert_eq!(conflict.message(), "custom");
        assert_eq!(conflict.local_timestamp(), Some(ts));
        assert_eq!(conflict.remote_timestamp(), Some(ts));
        assert_eq!(conflict.resolution(), &json!("a"));
    }
}
