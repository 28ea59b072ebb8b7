//! Transactions API client
//!
//! Provides a typed HTTP client for the remote transactions API. Handles
//! authentication headers, request pacing, the single 429 retry, and
//! JSON (de)serialization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ledgersync_api::client::ApiClient;
//! use ledgersync_core::domain::FieldRegistry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new("access-token-here", Arc::new(FieldRegistry::default()));
//! let transactions = client.get_transactions().await?;
//! println!("{} remote transactions", transactions.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ledgersync_core::config::ApiConfig;
use ledgersync_core::domain::{FieldRegistry, WriteBackError};
use ledgersync_core::ports::{TransactionUpdate, TransactionWriter};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::rate_limit::{parse_retry_after, RequestPacer, DEFAULT_RETRY_AFTER};
use crate::ApiError;

/// Default base URL of the transactions API
const DEFAULT_BASE_URL: &str = "https://dev.lunchmoney.app/v1";

/// Default request rate
const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 2.0;

/// Response from `GET /transactions`
#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<Value>,
}

/// HTTP client for the transactions API
///
/// Every request is paced through a [`RequestPacer`]. A 429 response is
/// retried exactly once after the server's `Retry-After` interval.
pub struct ApiClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Bearer token
    access_token: String,
    /// Decides which fields may be written back
    registry: Arc<FieldRegistry>,
    /// Spaces out successive requests
    pacer: RequestPacer,
    /// Wait used when a 429 carries no usable `Retry-After`
    default_retry_after: Duration,
}

impl ApiClient {
    /// Creates a client for the public API endpoint
    pub fn new(access_token: impl Into<String>, registry: Arc<FieldRegistry>) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL, registry)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        registry: Arc<FieldRegistry>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
            registry,
            pacer: RequestPacer::new(DEFAULT_MAX_REQUESTS_PER_SECOND),
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }

    /// Creates a client from the `api` configuration section
    ///
    /// # Errors
    /// Fails if no access token is configured or the HTTP client cannot be
    /// built.
    pub fn from_config(config: &ApiConfig, registry: Arc<FieldRegistry>) -> anyhow::Result<Self> {
        let token = config
            .access_token
            .clone()
            .context("api.access_token is not configured")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            access_token: token,
            registry,
            pacer: RequestPacer::new(config.max_requests_per_second),
            default_retry_after: DEFAULT_RETRY_AFTER,
        })
    }

    /// Replaces the request pacer
    pub fn with_max_requests_per_second(mut self, max_requests_per_second: f64) -> Self {
        self.pacer = RequestPacer::new(max_requests_per_second);
        self
    }

    /// Sets the wait used when a 429 response has no `Retry-After` header
    pub fn with_default_retry_after(mut self, retry_after: Duration) -> Self {
        self.default_retry_after = retry_after;
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base_url>/<segments...>` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one paced request, retrying once on HTTP 429
    ///
    /// Returns the last response received, which may still be a 429.
    async fn execute_with_retry(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Response, reqwest::Error> {
        let send = || {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&self.access_token);
            if let Some(body) = body {
                request = request.json(body);
            }
            request.send()
        };

        self.pacer.wait().await;
        let response = send().await?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let retry_after = self.retry_after(&response);
        info!(
            url = %url,
            retry_after_ms = retry_after.as_millis() as u64,
            "Received 429, backing off before single retry"
        );
        tokio::time::sleep(retry_after).await;

        self.pacer.wait().await;
        send().await
    }

    fn retry_after(&self, response: &Response) -> Duration {
        response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| parse_retry_after(v, self.default_retry_after))
            .unwrap_or(self.default_retry_after)
    }

    /// Fetches every remote transaction record
    ///
    /// Makes `GET /transactions` and returns the records of the
    /// `transactions` array unchanged.
    pub async fn get_transactions(&self) -> Result<Vec<Value>, ApiError> {
        let url = self.url(&["transactions"])?;
        debug!(url = %url, "Fetching remote transactions");

        let response = self.execute_with_retry(Method::GET, url, None).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::TooManyRequests {
                retry_after: self.retry_after(&response),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TransactionsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        info!(count = parsed.transactions.len(), "Fetched remote transactions");
        Ok(parsed.transactions)
    }

    fn check_value(&self, id: &str, field: &str, value: &Value) -> Result<(), WriteBackError> {
        let invalid = |message: String| WriteBackError::Validation {
            id: id.to_string(),
            message,
        };

        if self.registry.is_list_field(field) {
            let Value::Array(items) = value else {
                return Err(invalid(format!("field '{}' must be a list", field)));
            };
            if items.iter().any(|i| !(i.is_string() || i.is_number())) {
                return Err(invalid(format!(
                    "field '{}' may only contain strings or numbers",
                    field
                )));
            }
            return Ok(());
        }

        match value {
            Value::Array(_) | Value::Object(_) => Err(invalid(format!(
                "field '{}' must be a scalar value",
                field
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl TransactionWriter for ApiClient {
    #[tracing::instrument(skip(self, updates))]
    async fn update_transaction(
        &self,
        id: &str,
        updates: &Map<String, Value>,
        dry_run: bool,
    ) -> Result<bool, WriteBackError> {
        self.validate_update_data(id, updates)?;

        if dry_run {
            info!(transaction_id = %id, "Dry run: skipping remote update");
            return Ok(true);
        }

        let url = self.url(&["transactions", id]).map_err(|e| WriteBackError::Transport {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        let body = json!({ "transaction": updates });

        let response = self
            .execute_with_retry(Method::PUT, url, Some(&body))
            .await
            .map_err(|e| WriteBackError::Transport {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = self.retry_after(&response);
            error!(transaction_id = %id, "Still rate limited after retry");
            return Err(WriteBackError::RateLimited {
                id: id.to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(transaction_id = %id, status = status.as_u16(), "Remote update failed");
            return Err(WriteBackError::Http {
                id: id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| WriteBackError::Transport {
            id: id.to_string(),
            message: format!("invalid response body: {}", e),
        })?;

        match body.get("updated").and_then(Value::as_bool) {
            Some(updated) => {
                debug!(transaction_id = %id, updated, "Remote update acknowledged");
                Ok(updated)
            }
            None => {
                warn!(transaction_id = %id, body = %body, "Remote update not acknowledged");
                Ok(false)
            }
        }
    }

    async fn batch_update_transactions(
        &self,
        updates: &[TransactionUpdate],
        dry_run: bool,
    ) -> Vec<bool> {
        let mut outcomes = Vec::with_capacity(updates.len());
        for update in updates {
            let outcome = match self
                .update_transaction(&update.id, &update.updates, dry_run)
                .await
            {
                Ok(updated) => updated,
                Err(e) => {
                    warn!(transaction_id = %update.id, error = %e, "Batch item failed");
                    false
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    fn validate_update_data(
        &self,
        id: &str,
        updates: &Map<String, Value>,
    ) -> Result<(), WriteBackError> {
        let invalid = |message: String| WriteBackError::Validation {
            id: id.to_string(),
            message,
        };

        if id.trim().is_empty() {
            return Err(invalid("transaction id must not be empty".to_string()));
        }
        if updates.is_empty() {
            return Err(invalid("no fields to update".to_string()));
        }
        for (field, value) in updates {
            if !self.registry.contains(field) {
                return Err(invalid(format!("field '{}' is not mapped", field)));
            }
            if !self.registry.is_writable(field) {
                return Err(invalid(format!("field '{}' is not writable", field)));
            }
            self.check_value(id, field, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::with_base_url("token", "http://localhost:9", Arc::new(FieldRegistry::default()))
    }

    fn updates(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validate_accepts_writable_fields() {
        let client = client();
        let data = updates(json!({"note": "coffee", "labels": ["a", "b"], "needs_review": false}));
        assert!(client.validate_update_data("1", &data).is_ok());
    }

    #[test]
    fn test_validate_rejects_immutable_field() {
        let err = client()
            .validate_update_data("1", &updates(json!({"amount": 10})))
            .unwrap_err();
        assert_eq!(
            err,
            WriteBackError::Validation {
                id: "1".to_string(),
                message: "field 'amount' is not writable".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_rejects_unmapped_field() {
        let err = client()
            .validate_update_data("1", &updates(json!({"mystery": 1})))
            .unwrap_err();
        assert!(err.to_string().contains("not mapped"));
    }

    #[test]
    fn test_validate_rejects_malformed_values() {
        let client = client();
        assert!(client
            .validate_update_data("1", &updates(json!({"labels": "x"})))
            .is_err());
        assert!(client
            .validate_update_data("1", &updates(json!({"labels": [{"a": 1}]})))
            .is_err());
        assert!(client
            .validate_update_data("1", &updates(json!({"note": ["x"]})))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        let client = client();
        assert!(client.validate_update_data("", &updates(json!({"note": "x"}))).is_err());
        assert!(client.validate_update_data("1", &Map::new()).is_err());
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = ApiClient::with_base_url("t", "https://api.example.com/v1/", Arc::new(FieldRegistry::default()));
        let url = client.url(&["transactions", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/transactions/a%20b");
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = ApiConfig::default();
        assert!(ApiClient::from_config(&config, Arc::new(FieldRegistry::default())).is_err());

        let config = ApiConfig {
            access_token: Some("tok".to_string()),
            ..ApiConfig::default()
        };
        let client = ApiClient::from_config(&config, Arc::new(FieldRegistry::default())).unwrap();
        assert_eq!(client.base_url(), "https://dev.lunchmoney.app/v1");
    }
}
