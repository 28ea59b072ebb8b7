//! Integration tests for writing resolved fields back to the remote API

use std::time::Duration;

use ledgersync_core::domain::WriteBackError;
use ledgersync_core::ports::{TransactionUpdate, TransactionWriter};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, updates};

#[tokio::test]
async fn test_update_transaction_sends_payload() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/42"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(body_json(json!({"transaction": {"note": "coffee"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update_transaction("42", &updates(json!({"note": "coffee"})), false)
        .await
        .expect("update failed");

    assert!(updated);
}

#[tokio::test]
async fn test_update_transaction_reports_unacknowledged_update() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": ["locked"]})))
        .mount(&server)
        .await;

    let updated = client
        .update_transaction("42", &updates(json!({"note": "coffee"})), false)
        .await
        .expect("update failed");

    assert!(!updated);
}

#[tokio::test]
async fn test_dry_run_performs_no_request() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .expect(0)
        .mount(&server)
        .await;

    let updated = client
        .update_transaction("42", &updates(json!({"labels": ["a", "b"]})), true)
        .await
        .expect("dry run failed");

    assert!(updated);
}

#[tokio::test]
async fn test_invalid_update_is_rejected_before_any_request() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .update_transaction("42", &updates(json!({"amount": 5})), false)
        .await
        .unwrap_err();

    assert!(matches!(err, WriteBackError::Validation { ref id, .. } if id == "42"));
}

#[tokio::test]
async fn test_429_is_retried_exactly_once() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/7"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/transactions/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update_transaction("7", &updates(json!({"category": "Dining"})), false)
        .await
        .expect("retry should succeed");

    assert!(updated);
}

#[tokio::test]
async fn test_persistent_429_gives_up_after_one_retry() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/7"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let err = client
        .update_transaction("7", &updates(json!({"note": "x"})), false)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WriteBackError::RateLimited {
            id: "7".to_string(),
            retry_after: Duration::ZERO,
        }
    );
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_server_error_maps_to_http_error() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/9"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client
        .update_transaction("9", &updates(json!({"note": "x"})), false)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WriteBackError::Http {
            id: "9".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
    );
}

#[tokio::test]
async fn test_batch_outcomes_are_independent() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/transactions/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/transactions/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/transactions/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .mount(&server)
        .await;

    let batch = vec![
        TransactionUpdate::new("1", updates(json!({"note": "a"}))),
        TransactionUpdate::new("2", updates(json!({"note": "b"}))),
        TransactionUpdate::new("3", updates(json!({"note": "c"}))),
        TransactionUpdate::new("4", updates(json!({"amount": 1}))),
    ];

    let outcomes = client.batch_update_transactions(&batch, false).await;
    assert_eq!(outcomes, vec![true, false, true, false]);
}
