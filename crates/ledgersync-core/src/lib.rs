//! LedgerSync Core - Domain model and ports for ledger reconciliation
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `FieldChange`, `TransactionView`, `Conflict`, `TransactionResult`, `SyncSummary`
//! - **Field registry** - `FieldRegistry`, the per-field resolution policy table
//! - **Port definitions** - Traits for adapters: `TransactionWriter`, `Changelog`, `SyncReporter`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module holds plain value types and has no I/O.
//! Ports define the trait interfaces that adapter crates implement
//! (the remote API client, the changelog file, the run reporter).

pub mod config;
pub mod domain;
pub mod ports;
