//! Item catalog: the set of stimuli a game can show.
//!
//! A catalog is owned by the embedding application (flowers for Memory
//! Garden, animals for Animal Sounds, emotions for Emotion Explorer) and is
//! immutable for the lifetime of a session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// One stimulus. Identity is the `id`; `key` is what the presentation layer
/// uses to pick an emoji, colour or sound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub key: String,
}

impl Item {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }

    /// Whether two items are the same stimulus.
    pub fn same_as(&self, other: &Item) -> bool {
        self.id == other.id
    }
}

/// Ordered collection of distinct items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCatalog {
    items: Vec<Item>,
}

impl ItemCatalog {
    /// Build a catalog, rejecting empty catalogs and duplicate ids.
    pub fn new(items: Vec<Item>) -> Result<Self, ConfigurationError> {
        let catalog = Self { items };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the catalog invariants. Deserialized catalogs bypass
    /// [`ItemCatalog::new`], so the engine re-validates on `start()`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.items.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.id.is_empty() {
                return Err(ConfigurationError::EmptyItemId);
            }
            if !seen.insert(item.id.as_str()) {
                return Err(ConfigurationError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a list of ids to items, preserving catalog order.
    ///
    /// An empty id list selects the whole catalog. Unknown ids are skipped;
    /// callers validate them first via [`LevelPolicy::validate`](crate::policy::LevelPolicy::validate).
    pub fn subset(&self, ids: &[String]) -> Vec<Item> {
        if ids.is_empty() {
            return self.items.clone();
        }
        self.items
            .iter()
            .filter(|item| ids.iter().any(|id| *id == item.id))
            .cloned()
            .collect()
    }
}
