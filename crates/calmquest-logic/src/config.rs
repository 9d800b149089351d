//! Game variant configuration.
//!
//! A variant is one playable game: its catalog, its level table and its
//! mismatch policy. Variants are plain JSON so new games can be added without
//! touching the engine.
//!
//! ```json
//! [{
//!   "id": "memory_garden",
//!   "title": "Memory Garden",
//!   "terminate_on_mismatch": true,
//!   "catalog": [{ "id": "rose", "key": "🌹" }],
//!   "levels": [{ "name": "Garden", "round_count": 10, "advance_threshold_percent": 0 }]
//! }]
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::ItemCatalog;
use crate::error::ConfigurationError;
use crate::policy::LevelPolicy;
use crate::session::SessionOptions;

/// Errors loading variant configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("variant '{variant}' is invalid: {source}")]
    Invalid {
        variant: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("duplicate variant id: {0}")]
    DuplicateVariant(String),

    #[error("unknown variant: {0}")]
    UnknownVariant(String),
}

/// One playable game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVariant {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub terminate_on_mismatch: bool,
    pub catalog: ItemCatalog,
    pub levels: LevelPolicy,
}

impl GameVariant {
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            terminate_on_mismatch: self.terminate_on_mismatch,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.levels.is_empty() {
            return Err(ConfigurationError::NoLevels);
        }
        self.catalog.validate()?;
        self.levels.validate(&self.catalog)
    }
}

/// Parse and validate a JSON array of variants.
pub fn load_variants(json: &str) -> Result<Vec<GameVariant>, ConfigError> {
    let variants: Vec<GameVariant> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    for variant in &variants {
        if !seen.insert(variant.id.as_str()) {
            return Err(ConfigError::DuplicateVariant(variant.id.clone()));
        }
        variant.validate().map_err(|source| ConfigError::Invalid {
            variant: variant.id.clone(),
            source,
        })?;
    }
    log::debug!("loaded {} game variants", variants.len());
    Ok(variants)
}

/// Find a variant by id.
pub fn find_variant<'a>(variants: &'a [GameVariant], id: &str) -> Result<&'a GameVariant, ConfigError> {
    variants
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| ConfigError::UnknownVariant(id.to_string()))
}
