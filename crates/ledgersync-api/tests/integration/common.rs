//! Shared test helpers for transactions API integration tests
//!
//! Each helper starts a mock server and returns an ApiClient pointed at it.

use std::sync::Arc;
use std::time::Duration;

use ledgersync_api::client::ApiClient;
use ledgersync_core::domain::FieldRegistry;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a (MockServer, ApiClient) tuple.
///
/// The client does not pace requests and waits 10ms on a 429 without a
/// `Retry-After` header, so tests run fast.
pub async fn setup_api_mock() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_base_url(TEST_TOKEN, server.uri(), Arc::new(FieldRegistry::default()))
        .with_max_requests_per_second(0.0)
        .with_default_retry_after(Duration::from_millis(10));
    (server, client)
}

/// Converts a `json!` object literal into an update map
pub fn updates(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value
        .as_object()
        .cloned()
        .expect("updates must be a JSON object")
}
