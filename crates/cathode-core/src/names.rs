//! Name tables keyed by [`Identifier`].
//!
//! [`NameCache`] is the bidirectional name↔identifier map behind the
//! identifier registry. [`EntityNameTable`] holds custom display names for
//! individual entities, grouped by the composite that owns them.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::Identifier;

/// Bidirectional mapping between names and identifiers.
///
/// Within one cache the mapping is a bijection. The first registration of a
/// name or an identifier wins; any later insert that would reuse either side
/// is ignored. Iteration follows insertion order so encodings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCache {
    by_name: IndexMap<String, Identifier>,
    by_id: HashMap<Identifier, String>,
}

impl NameCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache from plain names, hashing each with
    /// [`Identifier::from_name`]. Blank lines are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cache = NameCache::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            cache.insert(name, Identifier::from_name(name));
        }
        cache
    }

    /// Registers `name` ↔ `id`.
    ///
    /// Returns `false` (and changes nothing) if either the name or the
    /// identifier is already registered.
    pub fn insert(&mut self, name: &str, id: Identifier) -> bool {
        if self.by_name.contains_key(name) || self.by_id.contains_key(&id) {
            return false;
        }
        self.by_name.insert(name.to_string(), id);
        self.by_id.insert(id, name.to_string());
        true
    }

    /// Looks up the identifier registered for `name`.
    pub fn id_of(&self, name: &str) -> Option<Identifier> {
        self.by_name.get(name).copied()
    }

    /// Looks up the name registered for `id`.
    pub fn name_of(&self, id: Identifier) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_id(&self, id: Identifier) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates `(name, id)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Identifier)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl<S: AsRef<str>> FromIterator<(S, Identifier)> for NameCache {
    fn from_iter<T: IntoIterator<Item = (S, Identifier)>>(iter: T) -> Self {
        let mut cache = NameCache::new();
        for (name, id) in iter {
            cache.insert(name.as_ref(), id);
        }
        cache
    }
}

/// Custom display names for entities, grouped by owning composite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNameTable {
    composites: IndexMap<Identifier, IndexMap<Identifier, String>>,
}

impl EntityNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the custom name of `entity` inside `composite`, if one is set.
    pub fn get(&self, composite: Identifier, entity: Identifier) -> Option<&str> {
        self.composites
            .get(&composite)
            .and_then(|entities| entities.get(&entity))
            .map(String::as_str)
    }

    /// Sets (or replaces) the custom name of `entity` inside `composite`.
    pub fn set(&mut self, composite: Identifier, entity: Identifier, name: impl Into<String>) {
        self.composites
            .entry(composite)
            .or_default()
            .insert(entity, name.into());
    }

    /// Removes a custom name. Composites left without names are dropped.
    pub fn remove(&mut self, composite: Identifier, entity: Identifier) -> Option<String> {
        let entities = self.composites.get_mut(&composite)?;
        let removed = entities.shift_remove(&entity);
        if entities.is_empty() {
            self.composites.shift_remove(&composite);
        }
        removed
    }

    /// Iterates composites and their per-entity names in insertion order.
    pub fn composites(
        &self,
    ) -> impl Iterator<Item = (Identifier, &IndexMap<Identifier, String>)> {
        self.composites.iter().map(|(id, names)| (*id, names))
    }

    /// Number of composites with at least one custom name.
    pub fn composite_count(&self) -> usize {
        self.composites.len()
    }

    /// Total number of named entities across all composites.
    pub fn len(&self) -> usize {
        self.composites.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.composites.is_empty()
    }
}
