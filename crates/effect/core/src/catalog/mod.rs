//! Static catalog of hierarchically-inheriting effect types.
//!
//! The catalog is loaded once from authored data and immutable thereafter.
//! Type ids are dot-hierarchical (`"fire"`, `"fire.major"`); a child type
//! names its parent and resolution deep-merges the whole chain. Parent
//! chains are validated at construction, so [`EffectCatalog::resolve`] can
//! walk them without a cycle guard.

pub mod definition;

use std::collections::{HashMap, HashSet};

pub use definition::{
    EffectTypeDefinition, PeriodicSpec, PeriodicTemplate, ResolvedEffectType, StackRule,
    StackingSpec, TargetFilter, TargetSpec,
};

/// Errors detected while validating a catalog at load time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("effect type {child:?} inherits from unknown parent {parent:?}")]
    UnknownParent { child: String, parent: String },

    #[error("effect type {id:?} participates in a parent cycle")]
    ParentCycle { id: String },
}

/// Hierarchical prefix match on dot-separated type ids.
///
/// `"fire.major"` matches the query `"fire"`; `"fire"` does not match
/// `"fire.major"`, and `"firefly"` does not match `"fire"`.
pub fn matches(type_id: &str, query: &str) -> bool {
    type_id == query
        || type_id
            .strip_prefix(query)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Immutable table of effect-type definitions.
#[derive(Clone, Debug, Default)]
pub struct EffectCatalog {
    types: HashMap<String, EffectTypeDefinition>,
}

impl EffectCatalog {
    /// Builds a catalog, validating every parent reference and rejecting
    /// parent cycles.
    pub fn from_definitions(
        types: HashMap<String, EffectTypeDefinition>,
    ) -> Result<Self, CatalogError> {
        for (id, def) in &types {
            let mut visited = HashSet::new();
            visited.insert(id.as_str());
            let mut current = (id.as_str(), def);
            while let Some(parent_id) = current.1.parent.as_deref() {
                let Some(parent) = types.get(parent_id) else {
                    return Err(CatalogError::UnknownParent {
                        child: current.0.to_owned(),
                        parent: parent_id.to_owned(),
                    });
                };
                if !visited.insert(parent_id) {
                    return Err(CatalogError::ParentCycle { id: id.clone() });
                }
                current = (parent_id, parent);
            }
        }
        Ok(Self { types })
    }

    /// Returns the raw (unmerged) definition of a type.
    pub fn get(&self, id: &str) -> Option<&EffectTypeDefinition> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates all catalog ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Resolves a type id to its fully-merged form.
    ///
    /// Walks the parent chain, deep-merging child over parent at each step,
    /// then fills in defaults. Computed on demand; chains are shallow in
    /// practice so no cache is kept.
    pub fn resolve(&self, id: &str) -> Option<ResolvedEffectType> {
        let merged = self.merged_definition(id)?;
        Some(ResolvedEffectType::from_definition(id, merged))
    }

    fn merged_definition(&self, id: &str) -> Option<EffectTypeDefinition> {
        let def = self.types.get(id)?;
        match def.parent.as_deref() {
            None => Some(def.clone()),
            // Parent existence is validated at load time; a miss here means
            // the catalog was constructed without validation.
            Some(parent_id) => {
                let parent = self.merged_definition(parent_id)?;
                Some(def.merged_over(&parent))
            }
        }
    }

    /// All catalog ids hierarchically matching `query`.
    pub fn matching_types(&self, query: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .types
            .keys()
            .map(String::as_str)
            .filter(|id| matches(id, query))
            .collect();
        ids.sort_unstable();
        ids
    }
}
