//! Value normalization
//!
//! Every equality decision in the resolvers and the comparator goes through
//! [`normalize`], so `"100.00"` equals `100`, `[" b", "a"]` equals
//! `["a", "b"]`, and `" coffee "` equals `"coffee"`.

use ledgersync_core::domain::{parse_decimal, FieldRegistry};
use rust_decimal::Decimal;
use serde_json::Value;

/// Comparison form of a field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Normalized {
    /// Missing key or JSON null
    Absent,
    Money(Decimal),
    /// Trimmed string
    Text(String),
    /// Deduplicated, sorted collection
    List(Vec<Normalized>),
    /// Canonical JSON text of any other value
    Raw(String),
}

/// Normalizes the value of `field` according to its registry flags
///
/// Absent and null collapse to [`Normalized::Absent`], except for list
/// fields where they become the empty list. Money fields that do not parse
/// as a decimal fall back to their raw form.
pub fn normalize(registry: &FieldRegistry, field: &str, value: Option<&Value>) -> Normalized {
    let value = value.filter(|v| !v.is_null());

    if registry.is_list_field(field) {
        return normalize_list(value);
    }

    let Some(value) = value else {
        return Normalized::Absent;
    };

    if registry.is_money_field(field) {
        if let Some(amount) = parse_decimal(value) {
            return Normalized::Money(amount.normalize());
        }
    }

    normalize_item(value)
}

/// Normalizes one scalar (or list element) without consulting the registry
pub fn normalize_item(value: &Value) -> Normalized {
    match value {
        Value::Null => Normalized::Absent,
        Value::String(s) => Normalized::Text(s.trim().to_string()),
        other => Normalized::Raw(canonical_json(other)),
    }
}

/// Returns true when both values of `field` normalize to the same form
pub fn equivalent(
    registry: &FieldRegistry,
    field: &str,
    a: Option<&Value>,
    b: Option<&Value>,
) -> bool {
    normalize(registry, field, a) == normalize(registry, field, b)
}

fn normalize_list(value: Option<&Value>) -> Normalized {
    let mut items: Vec<Normalized> = match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(normalize_item).collect(),
        Some(scalar) => vec![normalize_item(scalar)],
    };
    items.sort();
    items.dedup();
    Normalized::List(items)
}

/// JSON text with object keys sorted at every level
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}
