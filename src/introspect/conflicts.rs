//! Detection of distinct types that share a schema name.

use super::SchemaRegistry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Several qualified types resolved to the same display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    /// Distinct qualified identities, sorted
    pub qualified_types: Vec<String>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema name `{}` is shared by {}",
            self.name,
            self.qualified_types.join(", ")
        )
    }
}

/// Groups registry entries by display name (case-sensitive) and reports every group with
/// more than one identity, ordered by name. The registry is not modified.
pub fn detect(registry: &SchemaRegistry) -> Vec<Conflict> {
    let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for entry in registry.iter() {
        groups
            .entry(entry.name.as_str())
            .or_default()
            .insert(entry.qualified.as_str());
    }

    groups
        .into_iter()
        .filter(|(_, types)| types.len() > 1)
        .map(|(name, types)| Conflict {
            name: name.to_string(),
            qualified_types: types.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
