//! Field change records
//!
//! A [`FieldChange`] is the audit record of one field whose resolved value
//! differs from the value it replaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;
use super::strategy::ResolutionStrategy;

/// Which side(s) a field differs on, as classified by the comparator
///
/// The classification is descriptive: it is recorded for auditing and picks
/// the "old" value of a change, but never selects the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    NoChange,
    LocalOnly,
    RemoteOnly,
    BothChanged,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeType::NoChange => "no_change",
            ChangeType::LocalOnly => "local_only",
            ChangeType::RemoteOnly => "remote_only",
            ChangeType::BothChanged => "both_changed",
        };
        write!(f, "{}", s)
    }
}

/// One field whose value changes as a result of resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    field: String,
    old_value: Value,
    new_value: Value,
    change_type: ChangeType,
    strategy: ResolutionStrategy,
    timestamp: DateTime<Utc>,
}

impl FieldChange {
    /// Creates a change stamped with the current time
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyFieldName`] if `field` is empty.
    pub fn new(
        field: impl Into<String>,
        old_value: Value,
        new_value: Value,
        change_type: ChangeType,
        strategy: ResolutionStrategy,
    ) -> Result<Self, DomainError> {
        let field = field.into();
        if field.is_empty() {
            return Err(DomainError::EmptyFieldName);
        }
        Ok(Self {
            field,
            old_value,
            new_value,
            change_type,
            strategy,
            timestamp: Utc::now(),
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    pub fn new_value(&self) -> &Value {
        &self.new_value
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns true when both changes describe the same edit, ignoring when
    /// they were recorded
    pub fn same_edit(&self, other: &FieldChange) -> bool {
        self.field == other.field
            && self.old_value == other.old_value
            && self.new_value == other.new_value
            && self.change_type == other.change_type
            && self.strategy == other.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_change_rejects_empty_field() {
        let result = FieldChange::new(
            "",
            json!(1),
            json!(2),
            ChangeType::LocalOnly,
            ResolutionStrategy::LocalChangesOnly,
        );
        assert_eq!(result, Err(DomainError::EmptyFieldName));
    }

    #[test]
    fn test_field_change_accessors() {
        let change = FieldChange::new(
            "note",
            json!("latte"),
            json!("coffee"),
            ChangeType::BothChanged,
            ResolutionStrategy::LocalChangesOnly,
        )
        .unwrap();

        assert_eq!(change.field(), "note");
        assert_eq!(change.old_value(), &json!("latte"));
        assert_eq!(change.new_value(), &json!("coffee"));
        assert_eq!(change.change_type(), ChangeType::BothChanged);
        assert_eq!(change.strategy(), ResolutionStrategy::LocalChangesOnly);
    }

    #[test]
    fn test_same_edit_ignores_timestamp() {
        let make = || {
            FieldChange::new(
                "labels",
                json!(["a"]),
                json!(["a", "b"]),
                ChangeType::BothChanged,
                ResolutionStrategy::MergeLists,
            )
            .unwrap()
        };
        let a = make();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = make();
        assert!(a.same_edit(&b));
    }

    #[test]
    fn test_change_type_display() {
        assert_eq!(ChangeType::NoChange.to_string(), "no_change");
        assert_eq!(ChangeType::LocalOnly.to_string(), "local_only");
        assert_eq!(ChangeType::RemoteOnly.to_string(), "remote_only");
        assert_eq!(ChangeType::BothChanged.to_string(), "both_changed");
    }
}
