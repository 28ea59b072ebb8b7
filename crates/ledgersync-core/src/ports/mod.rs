//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the synchronizer depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`TransactionWriter`] - Pushes resolved values to the remote API
//! - [`Changelog`] - Append-only audit trail of mutations
//! - [`SyncReporter`] - Observational run reporting

pub mod changelog;
pub mod reporter;
pub mod writer;

pub use changelog::{Changelog, FieldDiff};
pub use reporter::SyncReporter;
pub use writer::{TransactionUpdate, TransactionWriter};
