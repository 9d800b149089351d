//! Score report payload for the score service.
//!
//! The backend accepts `POST /scores` with `{ userId, gameId, score }`. This
//! crate only builds and serializes the body; sending it is the caller's job.

use serde::{Deserialize, Serialize};

use crate::engine::GameSessionEngine;
use crate::selector::ItemSelector;
use crate::session::Phase;

/// Body of a `POST /scores` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub user_id: String,
    pub game_id: String,
    pub score: u32,
}

impl ScoreReport {
    pub fn new(user_id: impl Into<String>, game_id: impl Into<String>, score: u32) -> Self {
        Self {
            user_id: user_id.into(),
            game_id: game_id.into(),
            score,
        }
    }

    /// Report for a finished session; `None` until the engine is `Completed`.
    pub fn from_engine<S: ItemSelector>(
        engine: &GameSessionEngine<S>,
        user_id: &str,
        game_id: &str,
    ) -> Option<Self> {
        if engine.phase() != Phase::Completed {
            return None;
        }
        engine
            .session()
            .map(|s| Self::new(user_id, game_id, s.total_score))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
