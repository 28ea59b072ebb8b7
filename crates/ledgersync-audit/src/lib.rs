//! LedgerSync Audit - Append-only changelog of transaction mutations
//!
//! Provides:
//! - `JsonlChangelog`: `Changelog` port adapter writing one JSON object per line

pub mod changelog;

pub use changelog::JsonlChangelog;
