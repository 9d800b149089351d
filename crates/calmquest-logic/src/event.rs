//! Session events emitted for the presentation layer.
//!
//! Every engine operation returns the events it produced. The engine keeps
//! no copy; rendering, audio cues and "Game Over" screens are driven purely
//! from these values.

use serde::{Deserialize, Serialize};

use crate::catalog::Item;

/// One observable occurrence in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Show/play `item`, the `index`-th element of the sequence.
    SequenceItemRevealed { index: usize, item: Item },
    /// The player reproduced the whole sequence. `scored` is false when the
    /// round needed a replay after a mismatch.
    RoundSucceeded { round: u32, scored: bool },
    /// Wrong item or time ran out; `expected` is what should have come next.
    RoundFailed { expected: Item },
    /// Threshold met and play moves to the next level.
    LevelAdvanced { level_index: usize, name: String },
    /// Threshold missed; the game ends.
    LevelFailed {
        level_index: usize,
        name: String,
        percentage: u32,
    },
    /// The session is over.
    GameCompleted { final_score: u32 },
}

impl SessionEvent {
    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::GameCompleted { .. })
    }
}

/// Result of `begin_round` / `replay_round`: the whole sequence to play back,
/// plus one reveal event per item in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub sequence: Vec<Item>,
    pub events: Vec<SessionEvent>,
}

impl Presentation {
    pub(crate) fn of(sequence: &[Item]) -> Self {
        let events = sequence
            .iter()
            .enumerate()
            .map(|(index, item)| SessionEvent::SequenceItemRevealed {
                index,
                item: item.clone(),
            })
            .collect();
        Self {
            sequence: sequence.to_vec(),
            events,
        }
    }

    /// The item added this round.
    pub fn newest(&self) -> Option<&Item> {
        self.sequence.last()
    }
}
