//! Error types for the game-session engine.
//!
//! Only two things can go wrong when driving a session: the caller hands the
//! engine an unusable catalog/policy, or the caller invokes an operation in a
//! phase that does not allow it. Wrong answers and timeouts are *not* errors;
//! they are reported as [`SessionEvent`](crate::event::SessionEvent)s.

use crate::session::Phase;

/// A catalog or level policy that cannot drive a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("level policy has no levels")]
    NoLevels,

    #[error("item catalog is empty")]
    EmptyCatalog,

    #[error("item catalog contains an item with an empty id")]
    EmptyItemId,

    #[error("duplicate item id in catalog: {0}")]
    DuplicateItem(String),

    #[error("level {level} ({name}) has a round count of zero")]
    ZeroRounds { level: usize, name: String },

    #[error("level {level} ({name}) advance threshold {threshold}% is above 100%")]
    ThresholdOutOfRange {
        level: usize,
        name: String,
        threshold: u8,
    },

    #[error("level {level} ({name}) allows unknown item: {item}")]
    UnknownItem {
        level: usize,
        name: String,
        item: String,
    },

    #[error("session does not fit the catalog and policy: {0}")]
    InconsistentSession(String),
}

/// Errors returned by [`GameSessionEngine`](crate::engine::GameSessionEngine) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{operation} requires phase {}, but session is {actual:?}", expected_list(.expected))]
    InvalidState {
        operation: &'static str,
        expected: &'static [Phase],
        actual: Phase,
    },
}

fn expected_list(expected: &[Phase]) -> String {
    expected
        .iter()
        .map(|p| format!("{:?}", p))
        .collect::<Vec<_>>()
        .join(" or ")
}
