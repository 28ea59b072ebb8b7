//! Integration tests for fetching the remote transaction set

use ledgersync_api::ApiError;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_get_transactions_returns_records() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                {"id": 1, "amount": "12.50", "date": "2024-01-02", "payee": "Cafe"},
                {"id": 2, "amount": "99.00", "date": "2024-01-03", "labels": ["rent"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client.get_transactions().await.expect("get_transactions failed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["payee"], json!("Cafe"));
    assert_eq!(records[1]["labels"], json!(["rent"]));
}

#[tokio::test]
async fn test_get_transactions_unauthorized() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = client.get_transactions().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref body) if body == "bad token"));
}

#[tokio::test]
async fn test_get_transactions_malformed_body() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let err = client.get_transactions().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_get_transactions_retries_once_on_429() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"transactions": []})))
        .expect(1)
        .mount(&server)
        .await;

    let records = client.get_transactions().await.expect("retry should succeed");
    assert!(records.is_empty());
}
