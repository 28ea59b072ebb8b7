//! Terminal output for the `ledgersync` commands
//!
//! Human mode prints progress on stdout and problems on stderr. JSON mode
//! reserves stdout for the single result document and reports problems on
//! stderr as one JSON object per line.

use std::fmt::Display;

use anyhow::Result;
use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command output in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Console {
    format: OutputFormat,
}

impl Console {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Progress or detail line (human mode only)
    pub fn note(&self, message: impl Display) {
        if !self.is_json() {
            println!("  {}", message);
        }
    }

    /// Completion line (human mode only)
    pub fn done(&self, message: impl Display) {
        if !self.is_json() {
            println!("\u{2713} {}", message);
        }
    }

    pub fn problem(&self, message: impl Display) {
        self.diagnostic("error", "\u{2717} Error", message);
    }

    pub fn caution(&self, message: impl Display) {
        self.diagnostic("warning", "\u{26a0} Warning", message);
    }

    fn diagnostic(&self, level: &str, prefix: &str, message: impl Display) {
        match self.format {
            OutputFormat::Human => eprintln!("{}: {}", prefix, message),
            OutputFormat::Json => eprintln!(
                "{}",
                json!({"level": level, "message": message.to_string()})
            ),
        }
    }

    /// One labelled counter of a run summary
    pub fn stat(&self, label: &str, value: impl Display) {
        self.note(stat_line(label, value));
    }

    /// Writes the result document (JSON mode only)
    pub fn document(&self, value: &Value) -> Result<()> {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}

fn stat_line(label: &str, value: impl Display) -> String {
    format!("{:<14}{}", format!("{}:", label), value)
}

/// Returns `""` for one item and `"s"` otherwise
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// `count` followed by `noun`, pluralized
pub fn counted(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural(count))
}
