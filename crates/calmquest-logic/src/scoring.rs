//! Scoring utilities: level percentages, pass/fail, session summaries.

use serde::{Deserialize, Serialize};

/// Outcome of scoring one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Scored rounds as a percentage of the level's rounds, floored.
    pub percentage: u32,
    /// Whether the advance threshold was met.
    pub passed: bool,
}

/// Score a level.
///
/// `passed` uses the exact comparison `score * 100 >= threshold * rounds`,
/// so 1 of 3 rounds (33.3%) does not pass a 34% threshold but 1 of 2 passes
/// a 50% threshold. A level with zero rounds counts as fully scored.
pub fn level_progress(score: u32, round_count: u32, threshold_percent: u8) -> LevelProgress {
    if round_count == 0 {
        return LevelProgress {
            percentage: 100,
            passed: true,
        };
    }
    let score = u64::from(score.min(round_count));
    let rounds = u64::from(round_count);
    let percentage = (score * 100 / rounds) as u32;
    let passed = score * 100 >= u64::from(threshold_percent) * rounds;
    LevelProgress { percentage, passed }
}

/// Record of one finished level, kept in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level_index: usize,
    pub name: String,
    pub score: u32,
    pub round_count: u32,
    pub percentage: u32,
    pub passed: bool,
}

/// Summary of a whole session, for "Game Over" screens and score reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_score: u32,
    /// Levels that were passed.
    pub levels_cleared: usize,
    /// Whether every level was passed.
    pub completed_all_levels: bool,
    pub levels: Vec<LevelResult>,
}

impl SessionSummary {
    pub fn from_history(total_score: u32, level_count: usize, levels: Vec<LevelResult>) -> Self {
        let levels_cleared = levels.iter().filter(|l| l.passed).count();
        Self {
            total_score,
            levels_cleared,
            completed_all_levels: level_count > 0 && levels_cleared == level_count,
            levels,
        }
    }

    /// Mean percentage across finished levels, 0 when none finished.
    pub fn average_percentage(&self) -> u32 {
        if self.levels.is_empty() {
            return 0;
        }
        let sum: u32 = self.levels.iter().map(|l| l.percentage).sum();
        sum / self.levels.len() as u32
    }
}
