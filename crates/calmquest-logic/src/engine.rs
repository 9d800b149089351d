//! Game session engine: drives one round-based memory game from start to
//! finish.
//!
//! The engine is synchronous and does no I/O: it never sleeps, schedules or
//! plays sounds. Each operation checks the current [`Phase`], mutates the
//! [`GameSession`] and returns the [`SessionEvent`]s it produced. Pacing,
//! audio and timers belong to the caller.
//!
//! # Example
//!
//! ```
//! use calmquest_logic::catalog::{Item, ItemCatalog};
//! use calmquest_logic::engine::GameSessionEngine;
//! use calmquest_logic::policy::{Level, LevelPolicy};
//! use calmquest_logic::selector::ScriptedSelector;
//! use calmquest_logic::session::SessionOptions;
//!
//! let catalog = ItemCatalog::new(vec![Item::new("x", "X"), Item::new("y", "Y")]).unwrap();
//! let policy = LevelPolicy::new(vec![Level::new("Only", 1, 100)]);
//!
//! let mut engine = GameSessionEngine::with_selector(ScriptedSelector::new(["y"]));
//! engine.start(catalog, policy, SessionOptions::default()).unwrap();
//!
//! let shown = engine.begin_round().unwrap();
//! engine.presentation_finished().unwrap();
//! let events = engine.submit_input(&shown.sequence[0]).unwrap();
//! assert!(events.iter().any(|e| e.is_terminal()));
//! ```

use std::sync::Arc;

use crate::catalog::{Item, ItemCatalog};
use crate::error::{ConfigurationError, GameError};
use crate::event::{Presentation, SessionEvent};
use crate::policy::{Level, LevelPolicy};
use crate::scoring::{level_progress, LevelResult, SessionSummary};
use crate::selector::{ItemSelector, RandomSelector};
use crate::session::{GameSession, Phase, SessionOptions};

/// Everything that exists only while a session is running.
#[derive(Debug, Clone)]
struct ActiveSession {
    catalog: Arc<ItemCatalog>,
    policy: Arc<LevelPolicy>,
    session: GameSession,
    /// Items the current level may draw from.
    candidates: Vec<Item>,
}

impl ActiveSession {
    fn level(&self) -> &Level {
        &self.policy.levels()[self.session.current_level_index]
    }

    fn refresh_candidates(&mut self) {
        self.candidates = self.level().candidates(&self.catalog);
    }
}

/// Round/level state machine for sequence-memory games.
#[derive(Debug)]
pub struct GameSessionEngine<S = RandomSelector> {
    selector: S,
    active: Option<ActiveSession>,
}

impl GameSessionEngine<RandomSelector> {
    /// Engine with an entropy-seeded random selector.
    pub fn new() -> Self {
        Self::with_selector(RandomSelector::from_entropy())
    }

    /// Engine whose item choices are fully determined by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_selector(RandomSelector::seeded(seed))
    }
}

impl Default for GameSessionEngine<RandomSelector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ItemSelector> GameSessionEngine<S> {
    pub fn with_selector(selector: S) -> Self {
        Self {
            selector,
            active: None,
        }
    }

    // ── Operations ─────────────────────────────────────────────────────

    /// Create a new session at level 0, round 1. Emits no events; call
    /// [`begin_round`](Self::begin_round) next.
    pub fn start(
        &mut self,
        catalog: impl Into<Arc<ItemCatalog>>,
        policy: impl Into<Arc<LevelPolicy>>,
        options: SessionOptions,
    ) -> Result<(), GameError> {
        check_phase(&self.active, "start", &[Phase::Idle])?;
        let catalog = catalog.into();
        let policy = policy.into();
        validate_inputs(&catalog, &policy)?;

        let mut active = ActiveSession {
            catalog,
            policy,
            session: GameSession::new(options),
            candidates: Vec::new(),
        };
        active.refresh_candidates();
        log::debug!(
            "session started: {} levels, {} items, terminate_on_mismatch={}",
            active.policy.len(),
            active.catalog.len(),
            options.terminate_on_mismatch
        );
        self.active = Some(active);
        Ok(())
    }

    /// Grow the sequence by one item and hand the whole sequence back for
    /// playback, with one reveal event per item.
    pub fn begin_round(&mut self) -> Result<Presentation, GameError> {
        let active = expect_phase(&mut self.active, "begin_round", &[Phase::AwaitingRound])?;
        let item = self.selector.pick_one(&active.candidates).clone();
        let session = &mut active.session;
        session.sequence.push(item);
        session.user_input.clear();
        session.round_clean = true;
        session.phase = Phase::Presenting;
        log::debug!(
            "level {} round {}: revealing {} items",
            session.current_level_index,
            session.current_round,
            session.sequence.len()
        );
        Ok(Presentation::of(&session.sequence))
    }

    /// Playback is over; the player may now answer.
    pub fn presentation_finished(&mut self) -> Result<(), GameError> {
        let active = expect_phase(&mut self.active, "presentation_finished", &[Phase::Presenting])?;
        active.session.phase = Phase::AwaitingInput;
        Ok(())
    }

    /// Check the player's next item against the sequence.
    pub fn submit_input(&mut self, item: &Item) -> Result<Vec<SessionEvent>, GameError> {
        let active = expect_phase(&mut self.active, "submit_input", &[Phase::AwaitingInput])?;
        let Some(expected) = active.session.expected_next().cloned() else {
            return Err(GameError::InvalidState {
                operation: "submit_input",
                expected: &[Phase::AwaitingInput],
                actual: active.session.phase,
            });
        };

        active.session.user_input.push(item.clone());
        if !item.same_as(&expected) {
            log::debug!("mismatch: got '{}', expected '{}'", item.id, expected.id);
            return Ok(fail_round(active, expected, false));
        }
        if active.session.user_input.len() == active.session.sequence.len() {
            return Ok(complete_round(active));
        }
        Ok(Vec::new())
    }

    /// Play the failed round's sequence again from the start.
    pub fn replay_round(&mut self) -> Result<Presentation, GameError> {
        let active = expect_phase(&mut self.active, "replay_round", &[Phase::RoundFailed])?;
        active.session.user_input.clear();
        active.session.phase = Phase::Presenting;
        log::debug!(
            "replaying round {} ({} items)",
            active.session.current_round,
            active.session.sequence.len()
        );
        Ok(Presentation::of(&active.session.sequence))
    }

    /// The caller's round timer ran out.
    ///
    /// Reported like a mismatch. Under the replay policy the round is
    /// forfeited (unscored) and play moves on, evaluating the level if that
    /// was its last round.
    pub fn time_expired(&mut self) -> Result<Vec<SessionEvent>, GameError> {
        let active = expect_phase(
            &mut self.active,
            "time_expired",
            &[Phase::AwaitingInput, Phase::Presenting],
        )?;
        let Some(expected) = active.session.expected_next().cloned() else {
            return Err(GameError::InvalidState {
                operation: "time_expired",
                expected: &[Phase::AwaitingInput, Phase::Presenting],
                actual: active.session.phase,
            });
        };
        log::debug!(
            "time expired on level {} round {}",
            active.session.current_level_index,
            active.session.current_round
        );
        Ok(fail_round(active, expected, true))
    }

    /// Drop the session and return to `Idle`. Always succeeds.
    pub fn reset(&mut self) {
        if self.active.take().is_some() {
            log::debug!("session reset");
        }
    }

    /// Continue a previously saved session.
    ///
    /// The session is checked against `catalog` and `policy`; a session
    /// saved from a different game variant is rejected.
    pub fn resume(
        &mut self,
        catalog: impl Into<Arc<ItemCatalog>>,
        policy: impl Into<Arc<LevelPolicy>>,
        session: GameSession,
    ) -> Result<(), GameError> {
        check_phase(&self.active, "resume", &[Phase::Idle])?;
        let catalog = catalog.into();
        let policy = policy.into();
        validate_inputs(&catalog, &policy)?;
        check_session_fits(&session, &catalog, &policy)?;

        let mut active = ActiveSession {
            catalog,
            policy,
            session,
            candidates: Vec::new(),
        };
        active.refresh_candidates();
        log::debug!(
            "session resumed at level {} round {} ({:?})",
            active.session.current_level_index,
            active.session.current_round,
            active.session.phase
        );
        self.active = Some(active);
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        current_phase(&self.active)
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.active.as_ref().map(ActiveSession::level)
    }

    pub fn catalog(&self) -> Option<&ItemCatalog> {
        self.active.as_ref().map(|a| a.catalog.as_ref())
    }

    pub fn policy(&self) -> Option<&LevelPolicy> {
        self.active.as_ref().map(|a| a.policy.as_ref())
    }

    /// Current sequence; empty when idle.
    pub fn sequence(&self) -> &[Item] {
        self.active
            .as_ref()
            .map_or(&[][..], |a| a.session.sequence.as_slice())
    }

    /// Items the current level may draw from; the buttons a UI should show.
    pub fn candidates(&self) -> &[Item] {
        self.active
            .as_ref()
            .map_or(&[][..], |a| a.candidates.as_slice())
    }

    /// Score summary of the running or finished session.
    pub fn summary(&self) -> Option<SessionSummary> {
        self.active.as_ref().map(|a| {
            SessionSummary::from_history(
                a.session.total_score,
                a.policy.len(),
                a.session.level_history.clone(),
            )
        })
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }
}

// ── Transitions ────────────────────────────────────────────────────────

fn current_phase(active: &Option<ActiveSession>) -> Phase {
    active.as_ref().map_or(Phase::Idle, |a| a.session.phase)
}

/// Fail unless the current phase is one of `expected`.
fn check_phase(
    active: &Option<ActiveSession>,
    operation: &'static str,
    expected: &'static [Phase],
) -> Result<(), GameError> {
    let actual = current_phase(active);
    if expected.contains(&actual) {
        Ok(())
    } else {
        Err(GameError::InvalidState {
            operation,
            expected,
            actual,
        })
    }
}

/// Borrow the running session if its phase is one of `expected`.
/// `expected` never contains `Idle` here.
fn expect_phase<'a>(
    active: &'a mut Option<ActiveSession>,
    operation: &'static str,
    expected: &'static [Phase],
) -> Result<&'a mut ActiveSession, GameError> {
    check_phase(active, operation, expected)?;
    active.as_mut().ok_or(GameError::InvalidState {
        operation,
        expected,
        actual: Phase::Idle,
    })
}

fn validate_inputs(catalog: &ItemCatalog, policy: &LevelPolicy) -> Result<(), ConfigurationError> {
    if policy.is_empty() {
        return Err(ConfigurationError::NoLevels);
    }
    catalog.validate()?;
    policy.validate(catalog)
}

fn check_session_fits(
    session: &GameSession,
    catalog: &ItemCatalog,
    policy: &LevelPolicy,
) -> Result<(), ConfigurationError> {
    let inconsistent = |msg: String| Err(ConfigurationError::InconsistentSession(msg));

    let Some(level) = policy.level(session.current_level_index) else {
        return inconsistent(format!(
            "level index {} out of range ({} levels)",
            session.current_level_index,
            policy.len()
        ));
    };
    if session.phase == Phase::Idle {
        return inconsistent("session phase is Idle".into());
    }
    if session.current_round == 0 || session.current_round > level.round_count + 1 {
        return inconsistent(format!(
            "round {} outside level {} ({} rounds)",
            session.current_round, level.name, level.round_count
        ));
    }
    let candidates = level.candidates(catalog);
    if let Some(stray) = session
        .sequence
        .iter()
        .find(|item| !candidates.iter().any(|c| c.same_as(item)))
    {
        return inconsistent(format!("sequence item '{}' not allowed at this level", stray.id));
    }
    if session.phase.is_round_active() || session.phase == Phase::AwaitingRound {
        // Between rounds the next begin_round appends exactly one item.
        let expected_len = match session.phase {
            Phase::AwaitingRound => session.current_round as usize - 1,
            _ => session.current_round as usize,
        };
        if session.current_round > level.round_count {
            return inconsistent(format!(
                "round {} is past the end of level {} in {:?}",
                session.current_round, level.name, session.phase
            ));
        }
        if session.sequence.len() != expected_len {
            return inconsistent(format!(
                "sequence length {} does not fit round {} in {:?}",
                session.sequence.len(),
                session.current_round,
                session.phase
            ));
        }
    }
    if session.phase.is_round_active() && session.user_input.len() >= session.sequence.len() {
        return inconsistent("input already covers the whole sequence".into());
    }
    if session.score > level.round_count || session.score > session.total_score {
        return inconsistent(format!(
            "score {} inconsistent with total {} and {} rounds",
            session.score, session.total_score, level.round_count
        ));
    }
    Ok(())
}

/// Mismatch or timeout. `forfeit` moves past the round instead of
/// waiting for a replay when the session is not terminal-on-mismatch.
fn fail_round(active: &mut ActiveSession, expected: Item, forfeit: bool) -> Vec<SessionEvent> {
    let mut events = vec![SessionEvent::RoundFailed { expected }];
    let session = &mut active.session;
    session.user_input.clear();
    session.round_clean = false;

    if session.options.terminate_on_mismatch {
        record_level(active, false);
        finish(active, &mut events);
        return events;
    }

    if forfeit {
        session.current_round += 1;
        session.round_clean = true;
        advance_or_evaluate(active, &mut events);
    } else {
        session.phase = Phase::RoundFailed;
    }
    events
}

fn complete_round(active: &mut ActiveSession) -> Vec<SessionEvent> {
    let session = &mut active.session;
    let scored = session.round_clean;
    if scored {
        session.score += 1;
        session.total_score += 1;
    }
    let mut events = vec![SessionEvent::RoundSucceeded {
        round: session.current_round,
        scored,
    }];
    session.user_input.clear();
    session.current_round += 1;
    session.round_clean = true;
    advance_or_evaluate(active, &mut events);
    events
}

/// After a round closes: start the next round, or evaluate the level once
/// its round count is exhausted.
fn advance_or_evaluate(active: &mut ActiveSession, events: &mut Vec<SessionEvent>) {
    if active.session.current_round > active.level().round_count {
        evaluate_level_end(active, events);
    } else {
        active.session.phase = Phase::AwaitingRound;
    }
}

fn evaluate_level_end(active: &mut ActiveSession, events: &mut Vec<SessionEvent>) {
    let index = active.session.current_level_index;
    let level = active.level();
    let name = level.name.clone();
    let progress = level_progress(
        active.session.score,
        level.round_count,
        level.advance_threshold_percent,
    );
    record_level(active, progress.passed);

    if !progress.passed {
        log::info!(
            "level {} ({}) failed at {}%",
            index,
            name,
            progress.percentage
        );
        events.push(SessionEvent::LevelFailed {
            level_index: index,
            name,
            percentage: progress.percentage,
        });
        finish(active, events);
        return;
    }

    if index + 1 < active.policy.len() {
        active.session.start_next_level();
        active.refresh_candidates();
        let next = active.level().name.clone();
        log::info!(
            "level {} ({}) passed at {}%, advancing to {}",
            index,
            name,
            progress.percentage,
            next
        );
        events.push(SessionEvent::LevelAdvanced {
            level_index: index + 1,
            name: next,
        });
    } else {
        finish(active, events);
    }
}

fn record_level(active: &mut ActiveSession, passed: bool) {
    let level = active.level();
    let round_count = level.round_count;
    let name = level.name.clone();
    let session = &mut active.session;
    let percentage = level_progress(session.score, round_count, 0).percentage;
    session.level_history.push(LevelResult {
        level_index: session.current_level_index,
        name,
        score: session.score,
        round_count,
        percentage,
        passed,
    });
}

fn finish(active: &mut ActiveSession, events: &mut Vec<SessionEvent>) {
    let session = &mut active.session;
    session.phase = Phase::Completed;
    log::info!("game completed with total score {}", session.total_score);
    events.push(SessionEvent::GameCompleted {
        final_score: session.total_score,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::ScriptedSelector;

    fn xy() -> ItemCatalog {
        ItemCatalog::new(vec![Item::new("x", "X"), Item::new("y", "Y")]).unwrap()
    }

    fn x() -> Item {
        Item::new("x", "X")
    }

    fn y() -> Item {
        Item::new("y", "Y")
    }

    fn scripted(ids: &[&str]) -> GameSessionEngine<ScriptedSelector> {
        GameSessionEngine::with_selector(ScriptedSelector::new(ids.iter().copied()))
    }

    /// Start the next round and skip straight to input.
    fn present(engine: &mut GameSessionEngine<ScriptedSelector>) -> Vec<Item> {
        let p = engine.begin_round().unwrap();
        engine.presentation_finished().unwrap();
        p.sequence
    }

    /// Enter the whole sequence correctly; returns the last batch of events.
    fn answer(engine: &mut GameSessionEngine<ScriptedSelector>, seq: &[Item]) -> Vec<SessionEvent> {
        let mut last = Vec::new();
        for item in seq {
            last = engine.submit_input(item).unwrap();
        }
        last
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = GameSessionEngine::seeded(1);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.session().is_none());
        assert!(engine.sequence().is_empty());
        assert!(engine.summary().is_none());
    }

    #[test]
    fn test_start_rejects_empty_policy() {
        let mut engine = GameSessionEngine::seeded(1);
        let err = engine
            .start(xy(), LevelPolicy::new(Vec::new()), SessionOptions::default())
            .unwrap_err();
        assert_eq!(err, GameError::Configuration(ConfigurationError::NoLevels));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_rejects_empty_catalog() {
        let mut engine = GameSessionEngine::seeded(1);
        let err = engine
            .start(
                ItemCatalog::default(),
                LevelPolicy::new(vec![Level::new("L", 1, 0)]),
                SessionOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err, GameError::Configuration(ConfigurationError::EmptyCatalog));
    }

    #[test]
    fn test_start_twice_is_invalid_state() {
        let mut engine = scripted(&["x"]);
        let policy = LevelPolicy::new(vec![Level::new("L", 1, 0)]);
        engine.start(xy(), policy.clone(), SessionOptions::default()).unwrap();
        let err = engine.start(xy(), policy, SessionOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidState {
                operation: "start",
                actual: Phase::AwaitingRound,
                ..
            }
        ));
    }

    #[test]
    fn test_operations_in_wrong_phase_fail() {
        let mut engine = scripted(&["x"]);
        assert!(matches!(
            engine.begin_round(),
            Err(GameError::InvalidState { actual: Phase::Idle, .. })
        ));
        assert!(engine.submit_input(&x()).is_err());
        assert!(engine.presentation_finished().is_err());
        assert!(engine.replay_round().is_err());
        assert!(engine.time_expired().is_err());

        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 2, 0)]), SessionOptions::default())
            .unwrap();
        engine.begin_round().unwrap();
        // Still presenting: no input accepted yet.
        let err = engine.submit_input(&x()).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidState {
                operation: "submit_input",
                expected: &[Phase::AwaitingInput],
                actual: Phase::Presenting,
            }
        );
        assert!(engine.begin_round().is_err());
    }

    #[test]
    fn test_begin_round_returns_full_sequence_with_reveals() {
        let mut engine = scripted(&["x", "y", "x"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 3, 0)]), SessionOptions::default())
            .unwrap();
        let seq = present(&mut engine);
        answer(&mut engine, &seq);
        let p = engine.begin_round().unwrap();
        assert_eq!(p.sequence, vec![x(), y()]);
        assert_eq!(p.events.len(), 2);
        assert_eq!(
            p.events[1],
            SessionEvent::SequenceItemRevealed { index: 1, item: y() }
        );
        assert_eq!(engine.phase(), Phase::Presenting);
    }

    #[test]
    fn test_partial_input_stays_awaiting() {
        let mut engine = scripted(&["x", "y"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 3, 0)]), SessionOptions::default())
            .unwrap();
        let seq = present(&mut engine);
        answer(&mut engine, &seq);
        present(&mut engine);
        let events = engine.submit_input(&x()).unwrap();
        assert!(events.is_empty());
        assert_eq!(engine.phase(), Phase::AwaitingInput);
        assert_eq!(engine.session().unwrap().user_input, vec![x()]);
    }

    #[test]
    fn test_mismatch_replays_same_sequence() {
        let mut engine = scripted(&["x", "y"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 2, 0)]), SessionOptions::default())
            .unwrap();
        present(&mut engine);
        let events = engine.submit_input(&y()).unwrap();
        assert_eq!(events, vec![SessionEvent::RoundFailed { expected: x() }]);
        assert_eq!(engine.phase(), Phase::RoundFailed);
        let session = engine.session().unwrap();
        assert!(session.user_input.is_empty());
        assert_eq!(session.current_round, 1);
        assert!(!session.round_clean);

        let replay = engine.replay_round().unwrap();
        assert_eq!(replay.sequence, vec![x()]);
        engine.presentation_finished().unwrap();
        let events = engine.submit_input(&x()).unwrap();
        assert_eq!(events, vec![SessionEvent::RoundSucceeded { round: 1, scored: false }]);
        let session = engine.session().unwrap();
        assert_eq!(session.score, 0);
        assert_eq!(session.current_round, 2);
        assert_eq!(engine.phase(), Phase::AwaitingRound);
    }

    #[test]
    fn test_mismatch_terminates_when_configured() {
        let mut engine = scripted(&["x"]);
        engine
            .start(
                xy(),
                LevelPolicy::new(vec![Level::new("L", 3, 0)]),
                SessionOptions::terminal_on_mismatch(),
            )
            .unwrap();
        let seq = present(&mut engine);
        answer(&mut engine, &seq);
        present(&mut engine);
        let events = engine.submit_input(&y()).unwrap();
        assert_eq!(
            events,
            vec![
                SessionEvent::RoundFailed { expected: x() },
                SessionEvent::GameCompleted { final_score: 1 },
            ]
        );
        assert_eq!(engine.phase(), Phase::Completed);
        let summary = engine.summary().unwrap();
        assert_eq!(summary.levels.len(), 1);
        assert!(!summary.levels[0].passed);
    }

    #[test]
    fn test_time_expired_forfeits_round_in_replay_mode() {
        let mut engine = scripted(&["x", "y"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 2, 50).with_time_limit(10)]), SessionOptions::default())
            .unwrap();
        present(&mut engine);
        let events = engine.time_expired().unwrap();
        assert_eq!(events, vec![SessionEvent::RoundFailed { expected: x() }]);
        assert_eq!(engine.phase(), Phase::AwaitingRound);
        assert_eq!(engine.session().unwrap().current_round, 2);

        let seq = present(&mut engine);
        assert_eq!(seq.len(), 2);
        assert!(engine.session().unwrap().sequence_matches_round());
        let events = answer(&mut engine, &seq);
        assert_eq!(
            events,
            vec![
                SessionEvent::RoundSucceeded { round: 2, scored: true },
                SessionEvent::GameCompleted { final_score: 1 },
            ]
        );
    }

    #[test]
    fn test_time_expired_on_last_round_evaluates_level() {
        let mut engine = scripted(&["x"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 1, 100)]), SessionOptions::default())
            .unwrap();
        engine.begin_round().unwrap();
        // Timer may fire while the sequence is still being shown.
        let events = engine.time_expired().unwrap();
        assert_eq!(
            events,
            vec![
                SessionEvent::RoundFailed { expected: x() },
                SessionEvent::LevelFailed {
                    level_index: 0,
                    name: "L".into(),
                    percentage: 0
                },
                SessionEvent::GameCompleted { final_score: 0 },
            ]
        );
    }

    #[test]
    fn test_time_expired_terminal_policy_ends_game() {
        let mut engine = scripted(&["y"]);
        engine
            .start(
                xy(),
                LevelPolicy::new(vec![Level::new("L", 4, 0)]),
                SessionOptions::terminal_on_mismatch(),
            )
            .unwrap();
        present(&mut engine);
        let events = engine.time_expired().unwrap();
        assert_eq!(events.last(), Some(&SessionEvent::GameCompleted { final_score: 0 }));
        assert_eq!(engine.phase(), Phase::Completed);
        assert!(engine.begin_round().is_err());
    }

    #[test]
    fn test_level_advance_resets_level_state() {
        let catalog = xy();
        let policy = LevelPolicy::new(vec![
            Level::new("Easy", 1, 100),
            Level::new("Hard", 2, 100).with_items(["y"]),
        ]);
        let mut engine = scripted(&["x", "x", "x"]);
        engine.start(catalog, policy, SessionOptions::default()).unwrap();
        let seq = present(&mut engine);
        let events = answer(&mut engine, &seq);
        assert_eq!(
            events,
            vec![
                SessionEvent::RoundSucceeded { round: 1, scored: true },
                SessionEvent::LevelAdvanced {
                    level_index: 1,
                    name: "Hard".into()
                },
            ]
        );
        let session = engine.session().unwrap();
        assert_eq!(session.current_level_index, 1);
        assert_eq!(session.current_round, 1);
        assert_eq!(session.score, 0);
        assert_eq!(session.total_score, 1);
        assert!(session.sequence.is_empty());
        assert_eq!(engine.current_level().unwrap().name, "Hard");
        assert_eq!(engine.candidates(), &[y()]);

        // "x" is not allowed at Hard; the scripted selector falls back to "y".
        let seq = present(&mut engine);
        assert_eq!(seq, vec![y()]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = scripted(&["x"]);
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 1, 0)]), SessionOptions::default())
            .unwrap();
        engine.begin_round().unwrap();
        engine.reset();
        assert_eq!(engine.phase(), Phase::Idle);
        engine.reset();
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.session().is_none());
        engine
            .start(xy(), LevelPolicy::new(vec![Level::new("L", 1, 0)]), SessionOptions::default())
            .unwrap();
        assert_eq!(engine.phase(), Phase::AwaitingRound);
    }

    #[test]
    fn test_resume_continues_saved_session() {
        let policy = LevelPolicy::new(vec![Level::new("L", 3, 0)]);
        let mut engine = scripted(&["x", "y", "x"]);
        engine.start(xy(), policy.clone(), SessionOptions::default()).unwrap();
        let seq = present(&mut engine);
        answer(&mut engine, &seq);
        present(&mut engine);
        let saved = engine.session().unwrap().clone();

        let mut other = scripted(&["x"]);
        other.resume(xy(), policy, saved).unwrap();
        assert_eq!(other.phase(), Phase::AwaitingInput);
        other.submit_input(&x()).unwrap();
        let events = other.submit_input(&y()).unwrap();
        assert_eq!(events, vec![SessionEvent::RoundSucceeded { round: 2, scored: true }]);
    }

    #[test]
    fn test_resume_rejects_foreign_session() {
        let policy = LevelPolicy::new(vec![Level::new("L", 3, 0)]);
        let mut session = GameSession::new(SessionOptions::default());
        session.sequence = vec![Item::new("zebra", "Z")];
        session.phase = Phase::AwaitingInput;
        let mut engine = scripted(&["x"]);
        let err = engine.resume(xy(), policy, session).unwrap_err();
        assert!(matches!(
            err,
            GameError::Configuration(ConfigurationError::InconsistentSession(_))
        ));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_resume_rejects_round_ahead_of_sequence() {
        let policy = LevelPolicy::new(vec![Level::new("L", 4, 0)]);
        let mut session = GameSession::new(SessionOptions::default());
        session.current_round = 3;
        let mut engine = scripted(&["x"]);
        let err = engine.resume(xy(), policy.clone(), session.clone()).unwrap_err();
        assert!(matches!(
            err,
            GameError::Configuration(ConfigurationError::InconsistentSession(_))
        ));

        // Two rounds already played: the sequence holds two items.
        session.sequence = vec![x(), y()];
        engine.resume(xy(), policy, session).unwrap();
        let shown = engine.begin_round().unwrap();
        assert_eq!(shown.sequence.len(), 3);
        assert!(engine.session().unwrap().sequence_matches_round());
    }

    #[test]
    fn test_resume_rejects_spent_input_in_any_round_phase() {
        let policy = LevelPolicy::new(vec![Level::new("L", 3, 0)]);
        for phase in [Phase::Presenting, Phase::AwaitingInput, Phase::RoundFailed] {
            let mut session = GameSession::new(SessionOptions::default());
            session.sequence = vec![x()];
            session.user_input = vec![x()];
            session.phase = phase;
            let mut engine = scripted(&["x"]);
            let err = engine.resume(xy(), policy.clone(), session).unwrap_err();
            assert!(
                matches!(
                    err,
                    GameError::Configuration(ConfigurationError::InconsistentSession(_))
                ),
                "{:?} accepted",
                phase
            );
        }
    }

    #[test]
    fn test_resume_rejects_waiting_past_last_round() {
        let policy = LevelPolicy::new(vec![Level::new("L", 2, 0)]);
        let mut session = GameSession::new(SessionOptions::default());
        session.current_round = 3;
        session.sequence = vec![x(), y()];
        let mut engine = scripted(&["x"]);
        assert!(engine.resume(xy(), policy, session).is_err());
    }
}
