//! Error types for field resolution

use ledgersync_core::domain::{DomainError, ResolutionStrategy};
use thiserror::Error;

/// Errors raised while resolving a single field
///
/// These never abort a transaction: the engine records them on the result
/// and moves on to the next field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A resolver was asked to handle a field registered under another strategy
    #[error("field '{field}' is registered as {registered}, not {requested}")]
    StrategyMismatch {
        field: String,
        registered: ResolutionStrategy,
        requested: ResolutionStrategy,
    },

    /// Registry lookup or domain construction failed
    #[error(transparent)]
    Domain(#[from] DomainError),
}
