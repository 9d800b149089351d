//! Level policy: the difficulty curve of a game.
//!
//! Every CalmQuest game climbs through a few tiers (Easy / Medium / Hard),
//! each with its own round count, playback speed, time limit and advance
//! threshold. A [`LevelPolicy`] is that table as data.

use serde::{Deserialize, Serialize};

use crate::catalog::{Item, ItemCatalog};
use crate::error::ConfigurationError;

/// Default per-item reveal duration when a level does not set one.
pub const DEFAULT_REVEAL_MILLIS: u32 = 1500;

fn default_reveal_millis() -> u32 {
    DEFAULT_REVEAL_MILLIS
}

/// One difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Rounds to play before the level is evaluated.
    pub round_count: u32,
    /// Per-round time limit enforced by the caller's timer. 0 = untimed.
    #[serde(default)]
    pub time_limit_seconds: u32,
    /// Minimum percentage of scored rounds needed to advance (0-100).
    pub advance_threshold_percent: u8,
    /// Catalog ids usable at this level. Empty = whole catalog.
    #[serde(default)]
    pub allowed_items: Vec<String>,
    /// Suggested reveal duration per item, for the presentation layer.
    #[serde(default = "default_reveal_millis")]
    pub reveal_millis: u32,
}

impl Level {
    pub fn new(name: impl Into<String>, round_count: u32, advance_threshold_percent: u8) -> Self {
        Self {
            name: name.into(),
            round_count,
            time_limit_seconds: 0,
            advance_threshold_percent,
            allowed_items: Vec::new(),
            reveal_millis: DEFAULT_REVEAL_MILLIS,
        }
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit_seconds = seconds;
        self
    }

    pub fn with_items<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_items = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reveal_millis(mut self, millis: u32) -> Self {
        self.reveal_millis = millis;
        self
    }

    pub fn is_timed(&self) -> bool {
        self.time_limit_seconds > 0
    }

    /// The items a round at this level may draw from.
    pub fn candidates(&self, catalog: &ItemCatalog) -> Vec<Item> {
        catalog.subset(&self.allowed_items)
    }
}

/// Ordered list of levels. Index 0 is the first level played.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelPolicy {
    levels: Vec<Level>,
}

impl LevelPolicy {
    pub fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Upper bound on successful rounds in one session.
    pub fn total_rounds(&self) -> u32 {
        self.levels.iter().map(|l| l.round_count).sum()
    }

    /// Check the policy against the catalog it will be played with.
    pub fn validate(&self, catalog: &ItemCatalog) -> Result<(), ConfigurationError> {
        if self.levels.is_empty() {
            return Err(ConfigurationError::NoLevels);
        }
        for (index, level) in self.levels.iter().enumerate() {
            if level.round_count == 0 {
                return Err(ConfigurationError::ZeroRounds {
                    level: index,
                    name: level.name.clone(),
                });
            }
            if level.advance_threshold_percent > 100 {
                return Err(ConfigurationError::ThresholdOutOfRange {
                    level: index,
                    name: level.name.clone(),
                    threshold: level.advance_threshold_percent,
                });
            }
            if let Some(unknown) = level.allowed_items.iter().find(|id| !catalog.contains(id)) {
                return Err(ConfigurationError::UnknownItem {
                    level: index,
                    name: level.name.clone(),
                    item: unknown.clone(),
                });
            }
        }
        Ok(())
    }
}
