//! Resolution strategy tags
//!
//! The closed set of per-field policies. A field's strategy is fixed by the
//! [`FieldRegistry`](super::fields::FieldRegistry); resolvers are looked up
//! by this tag.

use serde::{Deserialize, Serialize};

/// Policy deciding which side is authoritative for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// The value must never drift; the remote copy is trusted
    NeverChange,
    /// Local edits are authoritative and pushed upstream
    LocalChangesOnly,
    /// Server-maintained values; the remote copy is taken as-is
    RemoteChangesOnly,
    /// The remote system classifies this field; remote wins on divergence
    RemoteWins,
    /// Collections are merged (ordered union, local first)
    MergeLists,
}

impl ResolutionStrategy {
    /// All strategies, in declaration order
    pub const ALL: [ResolutionStrategy; 5] = [
        ResolutionStrategy::NeverChange,
        ResolutionStrategy::LocalChangesOnly,
        ResolutionStrategy::RemoteChangesOnly,
        ResolutionStrategy::RemoteWins,
        ResolutionStrategy::MergeLists,
    ];

    /// Returns true if resolving this field may require a write-back
    pub fn may_write_back(&self) -> bool {
        matches!(
            self,
            ResolutionStrategy::LocalChangesOnly | ResolutionStrategy::MergeLists
        )
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionStrategy::NeverChange => "never_change",
            ResolutionStrategy::LocalChangesOnly => "local_changes_only",
            ResolutionStrategy::RemoteChangesOnly => "remote_changes_only",
            ResolutionStrategy::RemoteWins => "remote_wins",
            ResolutionStrategy::MergeLists => "merge_lists",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never_change" => Ok(ResolutionStrategy::NeverChange),
            "local_changes_only" => Ok(ResolutionStrategy::LocalChangesOnly),
            "remote_changes_only" => Ok(ResolutionStrategy::RemoteChangesOnly),
            "remote_wins" => Ok(ResolutionStrategy::RemoteWins),
            "merge_lists" => Ok(ResolutionStrategy::MergeLists),
            other => Err(format!("unknown resolution strategy '{other}'")),
        }
    }
}
