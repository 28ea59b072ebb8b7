//! Configuration module for LedgerSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Slowest accepted request rate: one call per hour.
pub const MIN_REQUESTS_PER_SECOND: f64 = 1.0 / 3600.0;

/// Top-level configuration for LedgerSync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the transactions API, without a trailing slash.
    pub base_url: String,
    /// Bearer token. `None` when only local files are reconciled.
    pub access_token: Option<String>,
    /// Upper bound on request rate; calls are spaced `1 / n` seconds apart.
    pub max_requests_per_second: f64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Resolve everything but skip write-back and changelog entries.
    pub dry_run: bool,
    /// Path to the JSON-lines changelog.
    pub changelog: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/ledgersync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("ledgersync")
            .join("config.yaml")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dev.lunchmoney.app/v1".to_string(),
            access_token: None,
            max_requests_per_second: 2.0,
            timeout_secs: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("ledgersync");
        Self {
            dry_run: false,
            changelog: data_dir.join("changelog.jsonl"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"api.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- api ---
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.api.base_url),
            });
        }
        let rate = self.api.max_requests_per_second;
        if !(rate.is_finite() && rate >= MIN_REQUESTS_PER_SECOND) {
            errors.push(ValidationError {
                field: "api.max_requests_per_second".into(),
                message: format!(
                    "must be a finite rate of at least {} (one request per hour)",
                    MIN_REQUESTS_PER_SECOND
                ),
            });
        }
        if self.api.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(token) = &self.api.access_token {
            if token.trim().is_empty() {
                errors.push(ValidationError {
                    field: "api.access_token".into(),
                    message: "must not be empty when set".into(),
                });
            }
        }

        // --- sync ---
        if self.sync.changelog.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.changelog".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use ledgersync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_base_url("http://localhost:8080/v1")
///     .sync_dry_run(true)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- api ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.api.access_token = Some(token.into());
        self
    }

    pub fn api_max_requests_per_second(mut self, rps: f64) -> Self {
        self.config.api.max_requests_per_second = rps;
        self
    }

    pub fn api_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.api.timeout_secs = seconds;
        self
    }

    // --- sync ---

    pub fn sync_dry_run(mut self, dry_run: bool) -> Self {
        self.config.sync.dry_run = dry_run;
        self
    }

    pub fn sync_changelog(mut self, path: PathBuf) -> Self {
        self.config.sync.changelog = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.api.base_url, "https://dev.lunchmoney.app/v1");
        assert!(cfg.api.access_token.is_none());
        assert_eq!(cfg.api.max_requests_per_second, 2.0);
        assert_eq!(cfg.api.timeout_secs, 30);
        assert!(!cfg.sync.dry_run);
        assert!(cfg.sync.changelog.ends_with("ledgersync/changelog.jsonl"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
api:
  base_url: http://localhost:9000/v1
  access_token: secret
  max_requests_per_second: 5.0
  timeout_secs: 10
sync:
  dry_run: true
  changelog: /tmp/ledgersync-changes.jsonl
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.api.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.api.access_token.as_deref(), Some("secret"));
        assert_eq!(cfg.api.max_requests_per_second, 5.0);
        assert_eq!(cfg.api.timeout_secs, 10);
        assert!(cfg.sync.dry_run);
        assert_eq!(
            cfg.sync.changelog,
            PathBuf::from("/tmp/ledgersync-changes.jsonl")
        );
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_yaml_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"sync:\n  dry_run: true\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert!(cfg.sync.dry_run);
        assert_eq!(cfg.api, ApiConfig::default());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_missing_file_is_error() {
        let result = Config::load(Path::new("/nonexistent/ledgersync/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_or_default_falls_back() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/ledgersync/config.yaml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("ledgersync/config.yaml"));
    }

    // -- Validation --

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = ConfigBuilder::new()
            .api_base_url("ftp://example.com")
            .api_max_requests_per_second(0.0)
            .api_timeout_secs(0)
            .api_access_token("  ")
            .logging_level("loud")
            .build();

        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "api.base_url",
                "api.max_requests_per_second",
                "api.timeout_secs",
                "api.access_token",
                "logging.level",
            ]
        );
    }

    #[test]
    fn validate_rejects_non_finite_rate() {
        let cfg = ConfigBuilder::new()
            .api_max_requests_per_second(f64::INFINITY)
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "api.max_requests_per_second");
    }

    #[test]
    fn validate_rejects_rate_below_one_per_hour() {
        let cfg = ConfigBuilder::new().api_max_requests_per_second(1e-30).build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "api.max_requests_per_second");

        let cfg = ConfigBuilder::new()
            .api_max_requests_per_second(MIN_REQUESTS_PER_SECOND)
            .build();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "api.timeout_secs: must be greater than 0");
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .api_base_url("http://127.0.0.1:1234")
            .api_access_token("tok")
            .sync_dry_run(true)
            .sync_changelog(PathBuf::from("/tmp/c.jsonl"))
            .logging_level("warn")
            .build();

        assert_eq!(cfg.api.base_url, "http://127.0.0.1:1234");
        assert_eq!(cfg.api.access_token.as_deref(), Some("tok"));
        assert!(cfg.sync.dry_run);
        assert_eq!(cfg.sync.changelog, PathBuf::from("/tmp/c.jsonl"));
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn build_validated_returns_errors() {
        let result = ConfigBuilder::new().api_timeout_secs(0).build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "api.timeout_secs");

        assert!(ConfigBuilder::new().build_validated().is_ok());
    }

    #[test]
    fn yaml_round_trip() {
        let cfg = ConfigBuilder::new().api_access_token("abc").build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
    }
}
