//! Built-in game variants.
//!
//! The JSON is embedded at compile time from `data/game_variants.json`, the
//! same file the simtest harness validates.

use crate::config::{find_variant, load_variants, ConfigError, GameVariant};

const BUILTIN_VARIANTS_JSON: &str = include_str!("../../../data/game_variants.json");

pub const MEMORY_GARDEN: &str = "memory_garden";
pub const MEMORY_GARDEN_RELAXED: &str = "memory_garden_relaxed";
pub const ANIMAL_SOUNDS: &str = "animal_sounds";
pub const EMOTION_EXPLORER: &str = "emotion_explorer";

/// Raw JSON of the built-in variants.
pub fn builtin_json() -> &'static str {
    BUILTIN_VARIANTS_JSON
}

/// All built-in variants, parsed and validated.
pub fn builtin_variants() -> Result<Vec<GameVariant>, ConfigError> {
    load_variants(BUILTIN_VARIANTS_JSON)
}

/// One built-in variant by id.
pub fn builtin_variant(id: &str) -> Result<GameVariant, ConfigError> {
    let variants = builtin_variants()?;
    find_variant(&variants, id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse_and_validate() {
        let variants = builtin_variants().unwrap();
        let ids: Vec<_> = variants.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![MEMORY_GARDEN, MEMORY_GARDEN_RELAXED, ANIMAL_SOUNDS, EMOTION_EXPLORER]
        );
    }

    #[test]
    fn test_memory_garden_is_ten_rounds_and_terminal() {
        let garden = builtin_variant(MEMORY_GARDEN).unwrap();
        assert!(garden.terminate_on_mismatch);
        assert_eq!(garden.levels.len(), 1);
        assert_eq!(garden.levels.total_rounds(), 10);
        assert_eq!(garden.catalog.len(), 4);
    }

    #[test]
    fn test_relaxed_garden_replays() {
        let garden = builtin_variant(MEMORY_GARDEN_RELAXED).unwrap();
        assert!(!garden.options().terminate_on_mismatch);
    }

    #[test]
    fn test_animal_sounds_levels() {
        let animals = builtin_variant(ANIMAL_SOUNDS).unwrap();
        let rounds: Vec<_> = animals.levels.levels().iter().map(|l| l.round_count).collect();
        assert_eq!(rounds, vec![3, 5, 7]);
        assert!(animals
            .levels
            .levels()
            .iter()
            .all(|l| l.advance_threshold_percent == 70));
        let reveal: Vec<_> = animals.levels.levels().iter().map(|l| l.reveal_millis).collect();
        assert_eq!(reveal, vec![2000, 1500, 1000]);
    }

    #[test]
    fn test_emotion_explorer_is_timed_with_growing_palette() {
        let emotions = builtin_variant(EMOTION_EXPLORER).unwrap();
        let levels = emotions.levels.levels();
        assert!(levels.iter().all(|l| l.is_timed()));
        assert_eq!(levels[0].candidates(&emotions.catalog).len(), 4);
        assert_eq!(levels[1].candidates(&emotions.catalog).len(), 6);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(
            builtin_variant("space_invaders"),
            Err(ConfigError::UnknownVariant(_))
        ));
    }
}
