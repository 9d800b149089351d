//! Session state: the mutable record of one play-through.

use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::scoring::LevelResult;

/// State-machine phase of a session.
///
/// ```text
/// Idle → AwaitingRound → Presenting → AwaitingInput ─┬→ AwaitingRound
///                            ↑                       ├→ RoundFailed ─┐
///                            └───────── replay ──────┼───────────────┘
///                                                    └→ Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No session; waiting for `start()`.
    Idle,
    /// Waiting for `begin_round()`.
    AwaitingRound,
    /// The sequence is being played back.
    Presenting,
    /// The player is reproducing the sequence.
    AwaitingInput,
    /// A mismatch happened; waiting for `replay_round()`.
    RoundFailed,
    /// Game over. Terminal until `reset()`.
    Completed,
}

impl Phase {
    /// Phases during which `len(sequence) == current_round` must hold.
    pub fn is_round_active(self) -> bool {
        matches!(
            self,
            Phase::Presenting | Phase::AwaitingInput | Phase::RoundFailed
        )
    }
}

/// Per-session options chosen by the game variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    /// End the game on the first wrong item (Animal Sounds) instead of
    /// replaying the round (Memory Garden replay mode).
    #[serde(default)]
    pub terminate_on_mismatch: bool,
}

impl SessionOptions {
    pub fn replay_on_mismatch() -> Self {
        Self {
            terminate_on_mismatch: false,
        }
    }

    pub fn terminal_on_mismatch() -> Self {
        Self {
            terminate_on_mismatch: true,
        }
    }
}

/// Mutable state of one play-through. Only the engine mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub current_level_index: usize,
    /// 1-based round number within the current level.
    pub current_round: u32,
    pub sequence: Vec<Item>,
    /// Items entered so far this round.
    pub user_input: Vec<Item>,
    /// Scored rounds in the current level.
    pub score: u32,
    /// Scored rounds across all levels.
    pub total_score: u32,
    pub phase: Phase,
    /// False once the current round has seen a mismatch.
    pub round_clean: bool,
    pub level_history: Vec<LevelResult>,
    pub options: SessionOptions,
}

impl GameSession {
    pub(crate) fn new(options: SessionOptions) -> Self {
        Self {
            current_level_index: 0,
            current_round: 1,
            sequence: Vec::new(),
            user_input: Vec::new(),
            score: 0,
            total_score: 0,
            phase: Phase::AwaitingRound,
            round_clean: true,
            level_history: Vec::new(),
            options,
        }
    }

    /// The item the player must enter next, if a round is in progress.
    pub fn expected_next(&self) -> Option<&Item> {
        self.sequence.get(self.user_input.len())
    }

    /// Whether the sequence length matches the round number.
    pub fn sequence_matches_round(&self) -> bool {
        self.sequence.len() == self.current_round as usize
    }

    pub(crate) fn start_next_level(&mut self) {
        self.current_level_index += 1;
        self.current_round = 1;
        self.score = 0;
        self.sequence.clear();
        self.user_input.clear();
        self.round_clean = true;
        self.phase = Phase::AwaitingRound;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_round_one() {
        let s = GameSession::new(SessionOptions::default());
        assert_eq!(s.current_level_index, 0);
        assert_eq!(s.current_round, 1);
        assert!(s.sequence.is_empty());
        assert_eq!(s.phase, Phase::AwaitingRound);
        assert!(s.round_clean);
        assert!(!s.options.terminate_on_mismatch);
    }

    #[test]
    fn test_expected_next_tracks_input() {
        let mut s = GameSession::new(SessionOptions::default());
        s.sequence = vec![Item::new("a", "A"), Item::new("b", "B")];
        assert_eq!(s.expected_next().unwrap().id, "a");
        s.user_input.push(Item::new("a", "A"));
        assert_eq!(s.expected_next().unwrap().id, "b");
        s.user_input.push(Item::new("b", "B"));
        assert!(s.expected_next().is_none());
    }

    #[test]
    fn test_start_next_level_resets_level_state_only() {
        let mut s = GameSession::new(SessionOptions::terminal_on_mismatch());
        s.current_round = 4;
        s.score = 3;
        s.total_score = 3;
        s.sequence = vec![Item::new("a", "A"); 3];
        s.round_clean = false;
        s.start_next_level();
        assert_eq!(s.current_level_index, 1);
        assert_eq!(s.current_round, 1);
        assert_eq!(s.score, 0);
        assert_eq!(s.total_score, 3);
        assert!(s.sequence.is_empty());
        assert!(s.round_clean);
        assert!(s.options.terminate_on_mismatch);
    }

    #[test]
    fn test_round_active_phases() {
        assert!(Phase::Presenting.is_round_active());
        assert!(Phase::AwaitingInput.is_round_active());
        assert!(Phase::RoundFailed.is_round_active());
        assert!(!Phase::AwaitingRound.is_round_active());
        assert!(!Phase::Idle.is_round_active());
        assert!(!Phase::Completed.is_round_active());
    }
}
