//! Field mapping registry
//!
//! Maps each transaction field name to its resolution policy and a handful of
//! flags (immutable, writable, list-valued, timestamp-valued, money-valued).
//! A registry is an immutable value built once and handed to the engine, so
//! tests can substitute their own mapping.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::strategy::ResolutionStrategy;
use super::strategy::ResolutionStrategy::{
    LocalChangesOnly, MergeLists, NeverChange, RemoteChangesOnly, RemoteWins,
};

/// Policy and flags registered for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub strategy: ResolutionStrategy,
    /// Drift between the two sides is unexpected
    pub immutable: bool,
    /// The remote API accepts updates for this field
    pub writable: bool,
    /// The value is a collection (labels, tags)
    pub list: bool,
    /// The value is a bookkeeping timestamp
    pub timestamp: bool,
    /// The value is a monetary amount compared as an exact decimal
    pub money: bool,
}

impl FieldMapping {
    /// Creates a mapping with the given strategy and every flag cleared
    pub const fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            immutable: false,
            writable: false,
            list: false,
            timestamp: false,
            money: false,
        }
    }

    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub const fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    pub const fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub const fn timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    pub const fn money(mut self) -> Self {
        self.money = true;
        self
    }
}

/// Standard ledger mapping used by [`FieldRegistry::default`]
const DEFAULT_MAPPINGS: &[(&str, FieldMapping)] = &[
    ("id", FieldMapping::new(NeverChange).immutable()),
    ("transaction_id", FieldMapping::new(NeverChange).immutable()),
    ("remote_id", FieldMapping::new(NeverChange).immutable()),
    ("external_id", FieldMapping::new(NeverChange).immutable()),
    ("amount", FieldMapping::new(NeverChange).immutable().money()),
    ("date", FieldMapping::new(NeverChange).immutable()),
    ("currency", FieldMapping::new(NeverChange).immutable()),
    ("account_id", FieldMapping::new(NeverChange).immutable()),
    ("asset_id", FieldMapping::new(NeverChange).immutable()),
    ("note", FieldMapping::new(LocalChangesOnly).writable()),
    ("notes", FieldMapping::new(LocalChangesOnly).writable()),
    ("memo", FieldMapping::new(LocalChangesOnly).writable()),
    ("payee", FieldMapping::new(LocalChangesOnly).writable()),
    ("created_at", FieldMapping::new(RemoteChangesOnly).timestamp()),
    ("updated_at", FieldMapping::new(RemoteChangesOnly).timestamp()),
    ("balance", FieldMapping::new(RemoteChangesOnly).money()),
    ("category", FieldMapping::new(RemoteWins).writable()),
    ("category_id", FieldMapping::new(RemoteWins).writable()),
    ("needs_review", FieldMapping::new(RemoteWins).writable()),
    ("status", FieldMapping::new(RemoteWins).writable()),
    ("labels", FieldMapping::new(MergeLists).writable().list()),
    ("tags", FieldMapping::new(MergeLists).writable().list()),
];

/// Immutable table from field name to [`FieldMapping`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistry {
    mappings: HashMap<String, FieldMapping>,
}

impl FieldRegistry {
    /// Starts an empty registry builder
    pub fn builder() -> FieldRegistryBuilder {
        FieldRegistryBuilder::default()
    }

    /// Returns the mapping for a field, if registered
    pub fn mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.mappings.get(field)
    }

    /// Returns the resolution strategy for a field
    ///
    /// # Errors
    /// Returns [`DomainError::UnmappedField`] if the field is not registered.
    pub fn get_strategy(&self, field: &str) -> Result<ResolutionStrategy, DomainError> {
        self.mapping(field)
            .map(|m| m.strategy)
            .ok_or_else(|| DomainError::UnmappedField(field.to_string()))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.mappings.contains_key(field)
    }

    pub fn is_immutable(&self, field: &str) -> bool {
        self.mapping(field).is_some_and(|m| m.immutable)
    }

    pub fn is_writable(&self, field: &str) -> bool {
        self.mapping(field).is_some_and(|m| m.writable)
    }

    pub fn is_list_field(&self, field: &str) -> bool {
        self.mapping(field).is_some_and(|m| m.list)
    }

    pub fn is_timestamp_field(&self, field: &str) -> bool {
        self.mapping(field).is_some_and(|m| m.timestamp)
    }

    pub fn is_money_field(&self, field: &str) -> bool {
        self.mapping(field).is_some_and(|m| m.money)
    }

    /// Returns the subset of `fields` that has no mapping
    pub fn validate_field_coverage<'a, I>(&self, fields: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields
            .into_iter()
            .filter(|f| !self.contains(f))
            .map(str::to_string)
            .collect()
    }

    /// Registered field names in sorted order
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mappings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        DEFAULT_MAPPINGS
            .iter()
            .fold(FieldRegistry::builder(), |b, (name, mapping)| {
                b.field(*name, *mapping)
            })
            .build()
    }
}

/// Builder for alternate registries
#[derive(Debug, Clone, Default)]
pub struct FieldRegistryBuilder {
    mappings: HashMap<String, FieldMapping>,
}

impl FieldRegistryBuilder {
    /// Registers (or replaces) a field mapping
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.mappings.insert(name.into(), mapping);
        self
    }

    /// Removes a field mapping
    pub fn without(mut self, name: &str) -> Self {
        self.mappings.remove(name);
        self
    }

    pub fn build(self) -> FieldRegistry {
        FieldRegistry {
            mappings: self.mappings,
        }
    }
}

impl From<FieldRegistry> for FieldRegistryBuilder {
    fn from(registry: FieldRegistry) -> Self {
        Self {
            mappings: registry.mappings,
        }
    }
}
