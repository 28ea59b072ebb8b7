//! Domain error types
//!
//! `DomainError` covers invalid domain values (empty identifiers, unmapped
//! fields). `WriteBackError` is the error contract of the
//! [`TransactionWriter`](crate::ports::TransactionWriter) port.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The field has no entry in the field registry
    #[error("Unmapped field: {0}")]
    UnmappedField(String),

    /// A field change was built without a field name
    #[error("Field name must not be empty")]
    EmptyFieldName,

    /// A transaction view was built without an id
    #[error("Transaction id must not be empty")]
    EmptyTransactionId,

    /// A record is not shaped like a transaction
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Errors raised while pushing resolved values to the remote system
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteBackError {
    /// The update payload was rejected before any network call
    #[error("Invalid update for transaction {id}: {message}")]
    Validation { id: String, message: String },

    /// The remote API answered with a non-success status
    #[error("HTTP {status} updating transaction {id}: {body}")]
    Http {
        id: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response
    #[error("Transport error updating transaction {id}: {message}")]
    Transport { id: String, message: String },

    /// Still throttled after the single permitted retry
    #[error("Rate limited updating transaction {id}, retry after {retry_after:?}")]
    RateLimited { id: String, retry_after: Duration },
}

impl WriteBackError {
    /// Returns the transaction id the error refers to
    pub fn transaction_id(&self) -> &str {
        match self {
            WriteBackError::Validation { id, .. }
            | WriteBackError::Http { id, .. }
            | WriteBackError::Transport { id, .. }
            | WriteBackError::RateLimited { id, .. } => id,
        }
    }

    /// Returns the HTTP status when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            WriteBackError::Http { status, .. } => Some(*status),
            WriteBackError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}
