//! Transaction records and the unified transaction view
//!
//! Records are exchanged as JSON objects. A [`TransactionView`] pairs the
//! local and remote records of one transaction and keeps typed copies of
//! the core business fields for convenience.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::DomainError;

/// One transaction record: field name to JSON value
pub type TransactionRecord = Map<String, Value>;

/// Field names accepted as a record identifier, in lookup order
pub const ID_FIELDS: &[&str] = &["id", "transaction_id", "remote_id"];

/// Field names read as a record's last-modification time, in lookup order
pub const MODIFIED_FIELDS: &[&str] = &["updated_at", "modified_at", "last_modified"];

/// Extracts the identifier of a record
///
/// Tries each of [`ID_FIELDS`] in order. Strings are trimmed; integers are
/// rendered in decimal. Empty strings and other value types do not count.
pub fn extract_id(record: &TransactionRecord) -> Option<String> {
    ID_FIELDS
        .iter()
        .find_map(|key| record.get(*key).and_then(normalize_id))
}

/// Canonical text of one identifier value, so `"3"` and `3` compare equal
pub fn normalize_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Reads the last-modification timestamp of a record (RFC 3339)
pub fn extract_modified_at(record: &TransactionRecord) -> Option<DateTime<Utc>> {
    MODIFIED_FIELDS.iter().find_map(|key| {
        record
            .get(*key)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Parses a monetary value into an exact decimal
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace, a
/// leading currency symbol and thousands separators are tolerated).
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_labels(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| as_text(Some(v)))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Local and remote records of one transaction, side by side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    id: String,
    local: TransactionRecord,
    remote: TransactionRecord,
    local_modified: Option<DateTime<Utc>>,
    remote_modified: Option<DateTime<Utc>>,
    amount: Option<Decimal>,
    date: Option<String>,
    payee: Option<String>,
    note: Option<String>,
    category: Option<String>,
    labels: Vec<String>,
    needs_review: Option<bool>,
    balance: Option<Decimal>,
    currency: Option<String>,
    account: Option<String>,
}

impl TransactionView {
    /// Builds the view for one matched pair
    ///
    /// Convenience copies prefer the remote value and fall back to the local
    /// one. Labels are always a list (empty when neither side has any).
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyTransactionId`] if `id` is blank.
    pub fn new(
        id: impl Into<String>,
        local: TransactionRecord,
        remote: TransactionRecord,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::EmptyTransactionId);
        }

        let pick = |keys: &[&str]| -> Option<&Value> {
            keys.iter()
                .find_map(|k| remote.get(*k).filter(|v| !v.is_null()))
                .or_else(|| {
                    keys.iter()
                        .find_map(|k| local.get(*k).filter(|v| !v.is_null()))
                })
        };

        let amount = pick(&["amount"]).and_then(parse_decimal);
        let date = as_text(pick(&["date"]));
        let payee = as_text(pick(&["payee", "merchant"]));
        let note = as_text(pick(&["note", "notes", "memo"]));
        let category = as_text(pick(&["category", "category_id"]));
        let labels = as_labels(pick(&["labels", "tags"]));
        let needs_review = pick(&["needs_review"]).and_then(Value::as_bool);
        let balance = pick(&["balance"]).and_then(parse_decimal);
        let currency = as_text(pick(&["currency"]));
        let account = as_text(pick(&["account_id", "account", "asset_id"]));

        Ok(Self {
            local_modified: extract_modified_at(&local),
            remote_modified: extract_modified_at(&remote),
            id,
            local,
            remote,
            amount,
            date,
            payee,
            note,
            category,
            labels,
            needs_review,
            balance,
            currency,
            account,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local(&self) -> &TransactionRecord {
        &self.local
    }

    pub fn remote(&self) -> &TransactionRecord {
        &self.remote
    }

    pub fn local_value(&self, field: &str) -> Option<&Value> {
        self.local.get(field)
    }

    pub fn remote_value(&self, field: &str) -> Option<&Value> {
        self.remote.get(field)
    }

    pub fn local_modified(&self) -> Option<DateTime<Utc>> {
        self.local_modified
    }

    pub fn remote_modified(&self) -> Option<DateTime<Utc>> {
        self.remote_modified
    }

    /// Sorted union of the field names present on either side
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .local
            .keys()
            .chain(self.remote.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn payee(&self) -> Option<&str> {
        self.payee.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn needs_review(&self) -> Option<bool> {
        self.needs_review
    }

    pub fn balance(&self) -> Option<Decimal> {
        self.balance
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> TransactionRecord {
        value.as_object().cloned().expect("test record must be an object")
    }

    #[test]
    fn test_extract_id_from_string_and_number() {
        assert_eq!(extract_id(&record(json!({"id": " 42 "}))), Some("42".to_string()));
        assert_eq!(extract_id(&record(json!({"id": 42}))), Some("42".to_string()));
    }

    #[test]
    fn test_extract_id_falls_back_to_alternate_keys() {
        let rec = record(json!({"transaction_id": "tx-9"}));
        assert_eq!(extract_id(&rec), Some("tx-9".to_string()));

        let rec = record(json!({"id": "", "remote_id": "r-1"}));
        assert_eq!(extract_id(&rec), Some("r-1".to_string()));
    }

    #[test]
    fn test_extract_id_missing() {
        assert_eq!(extract_id(&record(json!({"amount": 1}))), None);
        assert_eq!(extract_id(&record(json!({"id": null}))), None);
        assert_eq!(extract_id(&record(json!({"id": 1.5}))), None);
    }

    #[test]
    fn test_extract_modified_at() {
        let rec = record(json!({"updated_at": "2024-01-01T10:00:00Z"}));
        let ts = extract_modified_at(&rec).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T10:00:00+00:00");

        let rec = record(json!({"updated_at": "yesterday"}));
        assert!(extract_modified_at(&rec).is_none());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(&json!(100.00)), Some(Decimal::new(100, 0)));
        assert_eq!(parse_decimal(&json!("100.00")), Some(Decimal::new(10000, 2)));
        assert_eq!(parse_decimal(&json!(" $1,234.50 ")), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!("")), None);
    }

    #[test]
    fn test_view_rejects_empty_id() {
        let result = TransactionView::new("  ", Map::new(), Map::new());
        assert_eq!(result, Err(DomainError::EmptyTransactionId));
    }

    #[test]
    fn test_view_prefers_remote_copies() {
        let local = record(json!({"id": "1", "amount": "12.00", "note": "mine", "labels": ["x"]}));
        let remote = record(json!({
            "id": "1",
            "amount": 12.5,
            "payee": "Cafe",
            "updated_at": "2024-02-01T00:00:00Z"
        }));

        let view = TransactionView::new("1", local, remote).unwrap();
        assert_eq!(view.amount(), Some(Decimal::new(125, 1)));
        assert_eq!(view.note(), Some("mine"));
        assert_eq!(view.payee(), Some("Cafe"));
        assert_eq!(view.labels(), &["x".to_string()]);
        assert!(view.local_modified().is_none());
        assert!(view.remote_modified().is_some());
    }

    #[test]
    fn test_view_labels_never_absent() {
        let view = TransactionView::new("1", Map::new(), Map::new()).unwrap();
        assert!(view.labels().is_empty());
    }

    #[test]
    fn test_field_names_union_sorted() {
        let local = record(json!({"id": "1", "note": "a"}));
        let remote = record(json!({"id": "1", "amount": 1}));
        let view = TransactionView::new("1", local, remote).unwrap();
        assert_eq!(view.field_names(), vec!["amount", "id", "note"]);
    }
}
