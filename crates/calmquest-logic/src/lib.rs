//! Pure game-session logic for CalmQuest.
//!
//! CalmQuest's mini-games (Memory Garden, Animal Sounds, Emotion Explorer)
//! all follow one pattern: reveal a growing sequence, let the child repeat
//! it, score the round, move through levels. This crate is that pattern as a
//! single synchronous engine. It does no rendering, audio, timing or I/O;
//! the UI drives it and reacts to the events it returns.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Items (stimuli) and the immutable item catalog |
//! | [`config`] | Game variants loaded from JSON |
//! | [`engine`] | `GameSessionEngine`: round/level state machine |
//! | [`error`] | Configuration and invalid-state errors |
//! | [`event`] | Session events and round presentations |
//! | [`pacing`] | Playback schedule for the presentation layer |
//! | [`policy`] | Levels: round count, time limit, threshold, item subset |
//! | [`presets`] | Built-in variants (`data/game_variants.json`) |
//! | [`report`] | `POST /scores` payload |
//! | [`scoring`] | Level percentages, pass/fail, session summaries |
//! | [`selector`] | Injected item selection (seeded random, scripted) |
//! | [`session`] | Session state and phases |
//! | [`snapshot`] | Save/resume of an in-progress session |

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod pacing;
pub mod policy;
pub mod presets;
pub mod report;
pub mod scoring;
pub mod selector;
pub mod session;
pub mod snapshot;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::{Item, ItemCatalog};
    pub use crate::engine::GameSessionEngine;
    pub use crate::error::{ConfigurationError, GameError};
    pub use crate::event::{Presentation, SessionEvent};
    pub use crate::policy::{Level, LevelPolicy};
    pub use crate::selector::{ItemSelector, RandomSelector, ScriptedSelector};
    pub use crate::session::{GameSession, Phase, SessionOptions};
}
