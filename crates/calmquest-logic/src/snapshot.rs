//! Save/resume of an in-progress session.
//!
//! Uses JSON so the browser front-end can keep a snapshot in local storage.
//! The catalog and policy are not stored; the snapshot names its variant and
//! the engine re-checks the session against it on resume.

use serde::{Deserialize, Serialize};

use crate::engine::GameSessionEngine;
use crate::error::GameError;
use crate::selector::ItemSelector;
use crate::session::GameSession;

/// Version number for the snapshot format (increment when the format changes)
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("no session to snapshot")]
    NoSession,

    #[error("cannot resume snapshot: {0}")]
    Resume(#[from] GameError),
}

/// Serializable snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub variant_id: String,
    pub session: GameSession,
}

impl SessionSnapshot {
    /// Capture the engine's current session.
    pub fn capture<S: ItemSelector>(
        engine: &GameSessionEngine<S>,
        variant_id: &str,
    ) -> Result<Self, SnapshotError> {
        let session = engine.session().ok_or(SnapshotError::NoSession)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            variant_id: variant_id.to_string(),
            session: session.clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}
