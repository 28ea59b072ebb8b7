//! Resolution strategies
//!
//! One resolver per [`ResolutionStrategy`] tag. The set is closed: the
//! [`FieldResolver`] trait is sealed and [`ResolverTable`] holds exactly one
//! instance of each, so dispatch by tag cannot miss.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgersync_core::domain::{
    normalize_id, FieldRegistry, ResolutionStrategy, TransactionView, ID_FIELDS,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ResolutionError;
use crate::normalize::{equivalent, normalize_item};

mod sealed {
    pub trait Sealed {}
}

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The winning value (`Value::Null` when the winning side has none)
    pub value: Value,
    /// Set when the inputs were suspicious but resolution still succeeded
    pub warning: Option<String>,
}

impl Resolved {
    fn value(value: Value) -> Self {
        Self {
            value,
            warning: None,
        }
    }
}

/// A per-field resolution policy
pub trait FieldResolver: sealed::Sealed + Send + Sync {
    /// The tag this resolver implements
    fn strategy(&self) -> ResolutionStrategy;

    /// Chooses the value that wins for `field`
    ///
    /// # Errors
    /// Fails when `field` is unmapped or registered under another strategy.
    fn resolve(
        &self,
        view: &TransactionView,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        local_ts: Option<DateTime<Utc>>,
        remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError>;

    /// Whether the resolved value has to be pushed to the remote system
    fn should_write_back(
        &self,
        view: &TransactionView,
        field: &str,
        resolved: &Value,
        original_remote: Option<&Value>,
    ) -> bool;
}

fn check_registered(
    registry: &FieldRegistry,
    field: &str,
    requested: ResolutionStrategy,
) -> Result<(), ResolutionError> {
    let registered = registry.get_strategy(field)?;
    if registered != requested {
        return Err(ResolutionError::StrategyMismatch {
            field: field.to_string(),
            registered,
            requested,
        });
    }
    Ok(())
}

fn or_null(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or(Value::Null)
}

/// Immutable fields: the remote copy is trusted, drift is reported
///
/// Only a value present in the local record can drift; a missing local key
/// is not compared. Identifier fields compare by their canonical id text and
/// fall back to the local value when the remote record keys its id under
/// another name.
#[derive(Debug, Clone)]
pub struct NeverChangeResolver {
    registry: Arc<FieldRegistry>,
}

impl NeverChangeResolver {
    fn drifted(&self, field: &str, local: &Value, remote: Option<&Value>) -> bool {
        if ID_FIELDS.contains(&field) {
            return remote.is_some_and(|remote| normalize_id(local) != normalize_id(remote));
        }
        !equivalent(&self.registry, field, Some(local), remote)
    }
}

impl sealed::Sealed for NeverChangeResolver {}

impl FieldResolver for NeverChangeResolver {
    fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::NeverChange
    }

    fn resolve(
        &self,
        view: &TransactionView,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        _local_ts: Option<DateTime<Utc>>,
        _remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError> {
        check_registered(&self.registry, field, self.strategy())?;

        let kept = match remote {
            None if ID_FIELDS.contains(&field) => local,
            _ => remote,
        };
        let mut resolved = Resolved::value(or_null(kept));
        if local.is_some_and(|local| self.drifted(field, local, remote)) {
            warn!(
                transaction_id = %view.id(),
                field = %field,
                local = %or_null(local),
                remote = %resolved.value,
                "Unexpected drift in immutable field"
            );
            resolved.warning = Some(format!(
                "Unexpected drift in immutable field '{}' for transaction {}: local {}, remote {}; keeping remote value",
                field,
                view.id(),
                or_null(local),
                resolved.value
            ));
        }
        Ok(resolved)
    }

    fn should_write_back(&self, _: &TransactionView, _: &str, _: &Value, _: Option<&Value>) -> bool {
        false
    }
}

/// Locally-edited fields: the local value is authoritative
///
/// A field missing from the local record carries no local opinion, so the
/// remote value is kept. An explicit local `null` clears the field.
#[derive(Debug, Clone)]
pub struct LocalChangesOnlyResolver {
    registry: Arc<FieldRegistry>,
}

impl sealed::Sealed for LocalChangesOnlyResolver {}

impl FieldResolver for LocalChangesOnlyResolver {
    fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::LocalChangesOnly
    }

    fn resolve(
        &self,
        _view: &TransactionView,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        _local_ts: Option<DateTime<Utc>>,
        _remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError> {
        check_registered(&self.registry, field, self.strategy())?;
        let value = match local {
            Some(value) => value.clone(),
            None => or_null(remote),
        };
        Ok(Resolved::value(value))
    }

    fn should_write_back(
        &self,
        _view: &TransactionView,
        field: &str,
        resolved: &Value,
        original_remote: Option<&Value>,
    ) -> bool {
        !equivalent(&self.registry, field, Some(resolved), original_remote)
    }
}

/// Server-maintained fields: the remote copy is taken as-is
#[derive(Debug, Clone)]
pub struct RemoteChangesOnlyResolver {
    registry: Arc<FieldRegistry>,
}

impl sealed::Sealed for RemoteChangesOnlyResolver {}

impl FieldResolver for RemoteChangesOnlyResolver {
    fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::RemoteChangesOnly
    }

    fn resolve(
        &self,
        _view: &TransactionView,
        field: &str,
        _local: Option<&Value>,
        remote: Option<&Value>,
        _local_ts: Option<DateTime<Utc>>,
        _remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError> {
        check_registered(&self.registry, field, self.strategy())?;
        Ok(Resolved::value(or_null(remote)))
    }

    fn should_write_back(&self, _: &TransactionView, _: &str, _: &Value, _: Option<&Value>) -> bool {
        false
    }
}

/// Remote-classified fields: remote wins on any divergence
#[derive(Debug, Clone)]
pub struct RemoteWinsResolver {
    registry: Arc<FieldRegistry>,
}

impl sealed::Sealed for RemoteWinsResolver {}

impl FieldResolver for RemoteWinsResolver {
    fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::RemoteWins
    }

    fn resolve(
        &self,
        view: &TransactionView,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        _local_ts: Option<DateTime<Utc>>,
        _remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError> {
        check_registered(&self.registry, field, self.strategy())?;
        if !equivalent(&self.registry, field, local, remote) {
            debug!(
                transaction_id = %view.id(),
                field = %field,
                "Sides diverge, keeping remote value"
            );
        }
        Ok(Resolved::value(or_null(remote)))
    }

    fn should_write_back(&self, _: &TransactionView, _: &str, _: &Value, _: Option<&Value>) -> bool {
        false
    }
}

/// Collection fields: ordered union, local items first
#[derive(Debug, Clone)]
pub struct MergeListsResolver {
    registry: Arc<FieldRegistry>,
}

impl MergeListsResolver {
    fn items(value: Option<&Value>) -> Vec<Value> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(scalar) => vec![scalar.clone()],
        }
    }

    /// Union in encounter order, duplicates removed by normalized equality
    pub fn merge(local: Option<&Value>, remote: Option<&Value>) -> Value {
        let mut seen = HashSet::new();
        let merged: Vec<Value> = Self::items(local)
            .into_iter()
            .chain(Self::items(remote))
            .filter(|item| seen.insert(normalize_item(item)))
            .collect();
        Value::Array(merged)
    }
}

impl sealed::Sealed for MergeListsResolver {}

impl FieldResolver for MergeListsResolver {
    fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::MergeLists
    }

    fn resolve(
        &self,
        _view: &TransactionView,
        field: &str,
        local: Option<&Value>,
        remote: Option<&Value>,
        _local_ts: Option<DateTime<Utc>>,
        _remote_ts: Option<DateTime<Utc>>,
    ) -> Result<Resolved, ResolutionError> {
        check_registered(&self.registry, field, self.strategy())?;
        Ok(Resolved::value(Self::merge(local, remote)))
    }

    fn should_write_back(
        &self,
        _view: &TransactionView,
        field: &str,
        resolved: &Value,
        original_remote: Option<&Value>,
    ) -> bool {
        !equivalent(&self.registry, field, Some(resolved), original_remote)
    }
}

/// The five resolvers, built once and looked up by tag
#[derive(Debug, Clone)]
pub struct ResolverTable {
    never_change: NeverChangeResolver,
    local_changes_only: LocalChangesOnlyResolver,
    remote_changes_only: RemoteChangesOnlyResolver,
    remote_wins: RemoteWinsResolver,
    merge_lists: MergeListsResolver,
}

impl ResolverTable {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self {
            never_change: NeverChangeResolver {
                registry: Arc::clone(&registry),
            },
            local_changes_only: LocalChangesOnlyResolver {
                registry: Arc::clone(&registry),
            },
            remote_changes_only: RemoteChangesOnlyResolver {
                registry: Arc::clone(&registry),
            },
            remote_wins: RemoteWinsResolver {
                registry: Arc::clone(&registry),
            },
            merge_lists: MergeListsResolver { registry },
        }
    }

    /// Returns the resolver implementing `strategy`
    pub fn get(&self, strategy: ResolutionStrategy) -> &dyn FieldResolver {
        match strategy {
            ResolutionStrategy::NeverChange => &self.never_change,
            ResolutionStrategy::LocalChangesOnly => &self.local_changes_only,
            ResolutionStrategy::RemoteChangesOnly => &self.remote_changes_only,
            ResolutionStrategy::RemoteWins => &self.remote_wins,
            ResolutionStrategy::MergeLists => &self.merge_lists,
        }
    }
}
