//! LedgerSync Conflict - Field-level conflict resolution
//!
//! Provides:
//! - Value normalization for representation-independent comparison
//! - The five resolution strategies, dispatched by tag
//! - Field change detection and id-based transaction matching
//! - The per-transaction resolution engine

pub mod comparator;
pub mod error;
pub mod normalize;
pub mod resolver;
pub mod strategy;

pub use comparator::{match_transactions_by_id, IdentifiedRecord, MatchResult, MatchedPair, TransactionComparator};
pub use error::ResolutionError;
pub use normalize::{equivalent, normalize, Normalized};
pub use resolver::ResolutionEngine;
pub use strategy::{FieldResolver, Resolved, ResolverTable};
