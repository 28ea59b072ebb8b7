//! Coverage command - Report fields without a resolution strategy
//!
//! Scans every record in a file and lists the field names the registry
//! does not map. Such fields are left untouched by `ledgersync sync`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ledgersync_core::config::Config;
use ledgersync_core::domain::FieldRegistry;
use serde_json::Value;

use crate::commands::read_records;
use crate::output::{counted, Console, OutputFormat};

#[derive(Debug, Args)]
pub struct CoverageCommand {
    /// JSON file with transaction records
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Sorted union of the keys of every object record
fn field_names(records: &[Value]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|record| record.keys().cloned())
        .collect()
}

impl CoverageCommand {
    pub async fn execute(&self, _config: &Config, format: OutputFormat) -> Result<()> {
        let console = Console::new(format);

        let records = read_records(&self.file)?;
        let registry = FieldRegistry::default();
        let fields = field_names(&records);
        let unmapped = registry.validate_field_coverage(fields.iter().map(String::as_str));

        if console.is_json() {
            return console.document(&serde_json::json!({
                "file": self.file.display().to_string(),
                "records": records.len(),
                "fields": fields,
                "unmapped": unmapped,
            }));
        }

        if unmapped.is_empty() {
            console.done(format!(
                "All {} across {} are mapped",
                counted(fields.len(), "field"),
                counted(records.len(), "record")
            ));
        } else {
            console.caution(format!(
                "{} of {} have no resolution strategy and will not be synchronized:",
                unmapped.len(),
                counted(fields.len(), "field")
            ));
            for field in &unmapped {
                console.note(field);
            }
        }
        Ok(())
    }
}
