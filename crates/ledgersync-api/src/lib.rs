//! LedgerSync API - Remote transactions API client
//!
//! Provides an async client for:
//! - Fetching the remote transaction set
//! - Writing resolved field values back, one transaction at a time
//! - Pacing requests and honouring `Retry-After` on HTTP 429
//!
//! ## Modules
//!
//! - [`client`] - HTTP client implementing the `TransactionWriter` port
//! - [`rate_limit`] - Fixed-interval request pacing

pub mod client;
pub mod rate_limit;

use std::time::Duration;
use thiserror::Error;

pub use client::ApiClient;
pub use rate_limit::{parse_retry_after, RequestPacer};

/// Errors that can occur when reading from the transactions API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Still throttled after the single permitted retry
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration the server asked to wait
        retry_after: Duration,
    },

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The base URL cannot carry a path
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
