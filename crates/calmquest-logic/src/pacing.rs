//! Playback pacing plan for the presentation layer.
//!
//! The engine never sleeps; it hands back the sequence and lets the UI decide
//! how long each item stays on screen. This module turns a level's
//! `reveal_millis` into a concrete schedule so every game paces playback the
//! same way. Nothing here touches a clock.

use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::event::Presentation;

/// Pause between two reveals when none is given.
pub const DEFAULT_GAP_MILLIS: u32 = 500;

/// Shortest reveal the plan will produce, whatever the speed multiplier.
pub const MIN_REVEAL_MILLIS: u32 = 200;

/// When one item is shown, relative to the start of playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSlot {
    pub index: usize,
    pub item: Item,
    pub start_ms: u64,
    pub duration_ms: u32,
}

/// Timing knobs for a playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Base reveal duration, normally the level's `reveal_millis`.
    pub reveal_millis: u32,
    /// Pause after each reveal.
    pub gap_millis: u32,
    /// Multiplier on reveal duration (1.0, 0.8 and 0.6 for easy, medium and hard).
    pub speed_multiplier: f32,
}

impl PacingConfig {
    pub fn new(reveal_millis: u32) -> Self {
        Self {
            reveal_millis,
            gap_millis: DEFAULT_GAP_MILLIS,
            speed_multiplier: 1.0,
        }
    }

    pub fn with_gap(mut self, gap_millis: u32) -> Self {
        self.gap_millis = gap_millis;
        self
    }

    pub fn with_speed(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = multiplier;
        self
    }

    /// Effective per-item reveal duration.
    pub fn effective_reveal_millis(&self) -> u32 {
        let multiplier = if self.speed_multiplier.is_finite() && self.speed_multiplier > 0.0 {
            self.speed_multiplier
        } else {
            1.0
        };
        let scaled = (self.reveal_millis as f32 * multiplier).round() as u32;
        scaled.max(MIN_REVEAL_MILLIS)
    }
}

/// A full playback schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPlan {
    pub slots: Vec<RevealSlot>,
    /// Time from the first reveal until input may open.
    pub total_ms: u64,
}

impl PlaybackPlan {
    pub fn for_sequence(sequence: &[Item], config: &PacingConfig) -> Self {
        let duration = config.effective_reveal_millis();
        let step = u64::from(duration) + u64::from(config.gap_millis);
        let slots: Vec<RevealSlot> = sequence
            .iter()
            .enumerate()
            .map(|(index, item)| RevealSlot {
                index,
                item: item.clone(),
                start_ms: index as u64 * step,
                duration_ms: duration,
            })
            .collect();
        // No trailing gap after the last item.
        let total_ms = match slots.last() {
            Some(last) => last.start_ms + u64::from(last.duration_ms),
            None => 0,
        };
        Self { slots, total_ms }
    }

    pub fn for_presentation(presentation: &Presentation, config: &PacingConfig) -> Self {
        Self::for_sequence(&presentation.sequence, config)
    }

    /// The slot showing at `elapsed_ms`, if any (gaps show nothing).
    pub fn slot_at(&self, elapsed_ms: u64) -> Option<&RevealSlot> {
        self.slots.iter().find(|s| {
            elapsed_ms >= s.start_ms && elapsed_ms < s.start_ms + u64::from(s.duration_ms)
        })
    }
}
