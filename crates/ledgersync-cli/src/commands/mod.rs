//! CLI subcommands

pub mod coverage;
pub mod sync;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Reads a JSON file holding transaction records
///
/// Accepts either a bare array or an object with a `transactions` array,
/// the shape returned by the remote API.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("transactions") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!(
                "{} must contain a JSON array or an object with a 'transactions' array",
                path.display()
            ),
        },
        _ => bail!("{} must contain a JSON array of records", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_bare_array() {
        let file = write_temp(r#"[{"id": "1"}, {"id": "2"}]"#);
        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_wrapped_array() {
        let file = write_temp(r#"{"transactions": [{"id": 7}]}"#);
        let records = read_records(file.path()).unwrap();
        assert_eq!(records, vec![serde_json::json!({"id": 7})]);
    }

    #[test]
    fn test_read_rejects_other_shapes() {
        assert!(read_records(write_temp(r#"{"items": []}"#).path()).is_err());
        assert!(read_records(write_temp("42").path()).is_err());
        assert!(read_records(write_temp("not json").path()).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
