//! Domain entities and business rules
//!
//! This module contains the core domain types for LedgerSync:
//! - Resolution strategy tags and the field mapping registry
//! - Transaction records and the unified local/remote view
//! - Field changes, conflicts and per-transaction results
//! - The run summary and changelog entries
//! - Domain-specific error types

pub mod audit;
pub mod change;
pub mod conflict;
pub mod errors;
pub mod fields;
pub mod result;
pub mod strategy;
pub mod summary;
pub mod transaction;

// Re-export commonly used types
pub use audit::{ChangelogAction, ChangelogEntry};
pub use change::{ChangeType, FieldChange};
pub use conflict::Conflict;
pub use errors::{DomainError, WriteBackError};
pub use fields::{FieldMapping, FieldRegistry, FieldRegistryBuilder};
pub use result::{SyncDirection, SyncStatus, TransactionResult, TransactionResultBuilder};
pub use strategy::ResolutionStrategy;
pub use summary::SyncSummary;
pub use transaction::{
    extract_id, extract_modified_at, normalize_id, parse_decimal, TransactionRecord, TransactionView,
    ID_FIELDS, MODIFIED_FIELDS,
};
