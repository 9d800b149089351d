//! CalmQuest Headless Play Harness
//!
//! Drives every game variant with simulated players and validates the
//! session engine's invariants. Runs entirely in-process: no UI, no timers.
//!
//! Usage:
//!   cargo run -p calmquest-simtest
//!   cargo run -p calmquest-simtest -- --variant animal_sounds --sessions 500 --verbose
//!   cargo run -p calmquest-simtest -- --config my_variants.json --mistake-rate 0.3

use std::path::PathBuf;

use calmquest_logic::catalog::{Item, ItemCatalog};
use calmquest_logic::config::{find_variant, load_variants, GameVariant};
use calmquest_logic::engine::GameSessionEngine;
use calmquest_logic::event::SessionEvent;
use calmquest_logic::pacing::{PacingConfig, PlaybackPlan};
use calmquest_logic::policy::{Level, LevelPolicy, DEFAULT_REVEAL_MILLIS};
use calmquest_logic::presets;
use calmquest_logic::report::ScoreReport;
use calmquest_logic::selector::{ItemSelector, RandomSelector, ScriptedSelector};
use calmquest_logic::session::{Phase, SessionOptions};
use calmquest_logic::snapshot::SessionSnapshot;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound on engine calls for one session before it counts as stuck.
const MAX_STEPS: usize = 100_000;

/// Wrong answers a simulated player makes in one round before letting the
/// timer run out.
const MAX_ATTEMPTS_PER_ROUND: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "calmquest-simtest")]
#[command(version, about, long_about = None)]
struct Args {
    /// Only run this variant id
    #[arg(long)]
    variant: Option<String>,

    /// Simulated sessions per variant
    #[arg(long, default_value_t = 200)]
    sessions: u32,

    /// Base seed; session `i` uses `seed + i`
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Probability that a simulated player enters a wrong item
    #[arg(long, default_value_t = 0.15, value_parser = parse_probability)]
    mistake_rate: f64,

    /// Print every check, not only failures (also enables debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Variant JSON file to test instead of the built-in variants
    #[arg(long)]
    config: Option<PathBuf>,
}

/// A probability in `[0, 1]`; NaN and infinities are rejected.
fn parse_probability(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("'{}' is not a number: {}", s, e))?;
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not between 0 and 1", value))
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("=== CalmQuest Play Harness ===\n");

    let mistake_rate = args.mistake_rate;

    let mut results = Vec::new();

    // 1. Variant definitions
    let variants = match load_selected_variants(&args) {
        Ok(v) => {
            results.push(check("variants_load", true, format!("{} variants", v.len())));
            v
        }
        Err(detail) => {
            results.push(check("variants_load", false, detail));
            Vec::new()
        }
    };
    results.extend(validate_variants(&variants, args.verbose));

    // 2. Reference scenarios
    results.extend(validate_reference_scenarios(args.verbose));

    // 3. Simulated players
    for variant in &variants {
        results.extend(validate_simulated_play(variant, &args, mistake_rate));
    }

    // 4. Same seed, same game
    for variant in &variants {
        results.push(validate_determinism(variant, args.seed, mistake_rate));
    }

    // 5. Score report and save/resume
    for variant in &variants {
        results.extend(validate_report_and_snapshot(variant, args.seed));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_selected_variants(args: &Args) -> Result<Vec<GameVariant>, String> {
    let variants = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            load_variants(&json).map_err(|e| e.to_string())?
        }
        None => presets::builtin_variants().map_err(|e| e.to_string())?,
    };
    match &args.variant {
        Some(id) => {
            let variant = find_variant(&variants, id).map_err(|e| e.to_string())?;
            Ok(vec![variant.clone()])
        }
        None => Ok(variants),
    }
}

// ── 1. Variant Definitions ──────────────────────────────────────────────

fn validate_variants(variants: &[GameVariant], verbose: bool) -> Vec<TestResult> {
    println!("--- Variant Definitions ---");
    let mut results = Vec::new();

    results.push(check(
        "variants_not_empty",
        !variants.is_empty(),
        format!("{} variants selected", variants.len()),
    ));

    for variant in variants {
        let validation = variant.validate();
        results.push(check(
            format!("{}_valid", variant.id),
            validation.is_ok(),
            match validation {
                Ok(()) => format!(
                    "{} items, {} levels, {} rounds",
                    variant.catalog.len(),
                    variant.levels.len(),
                    variant.levels.total_rounds()
                ),
                Err(e) => e.to_string(),
            },
        ));

        // Every level must be able to show at least one item.
        let starved: Vec<&str> = variant
            .levels
            .levels()
            .iter()
            .filter(|l| l.candidates(&variant.catalog).is_empty())
            .map(|l| l.name.as_str())
            .collect();
        results.push(check(
            format!("{}_levels_have_items", variant.id),
            starved.is_empty(),
            if starved.is_empty() {
                "every level has candidates".to_string()
            } else {
                format!("no candidates: {:?}", starved)
            },
        ));

        if verbose {
            for (i, level) in variant.levels.levels().iter().enumerate() {
                let longest = PlaybackPlan::for_sequence(
                    &vec![variant.catalog.items()[0].clone(); level.round_count as usize],
                    &PacingConfig::new(level.reveal_millis),
                );
                println!(
                    "  {} L{} {:<8} rounds={} threshold={}% limit={}s longest playback={}ms",
                    variant.id,
                    i,
                    level.name,
                    level.round_count,
                    level.advance_threshold_percent,
                    level.time_limit_seconds,
                    longest.total_ms
                );
            }
        }
    }

    results
}

// ── 2. Reference Scenarios ──────────────────────────────────────────────

fn validate_reference_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Reference Scenarios ---");
    let mut results = Vec::new();

    let catalog = match ItemCatalog::new(vec![Item::new("X", "x"), Item::new("Y", "y")]) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("scenario_catalog", false, e.to_string()));
            return results;
        }
    };

    // A: perfect play over three rounds.
    let outcome = (|| -> Result<Vec<SessionEvent>, String> {
        let mut engine = GameSessionEngine::with_selector(ScriptedSelector::new(["X", "Y", "X"]));
        let policy = LevelPolicy::new(vec![Level::new("Only", 3, 100)]);
        engine
            .start(catalog.clone(), policy, SessionOptions::default())
            .map_err(|e| e.to_string())?;
        let mut events = Vec::new();
        for _ in 0..3 {
            let shown = engine.begin_round().map_err(|e| e.to_string())?;
            engine.presentation_finished().map_err(|e| e.to_string())?;
            for item in &shown.sequence {
                events.extend(engine.submit_input(item).map_err(|e| e.to_string())?);
            }
        }
        Ok(events)
    })();
    results.push(match outcome {
        Ok(events) => check(
            "scenario_perfect_play",
            events.last() == Some(&SessionEvent::GameCompleted { final_score: 3 }),
            format!("last event {:?}", events.last()),
        ),
        Err(e) => check("scenario_perfect_play", false, e),
    });

    // B: a wrong item keeps the sequence for a retry.
    let outcome = (|| -> Result<bool, String> {
        let mut engine = GameSessionEngine::with_selector(ScriptedSelector::new(["X", "Y"]));
        let policy = LevelPolicy::new(vec![Level::new("Only", 3, 100)]);
        engine
            .start(catalog.clone(), policy, SessionOptions::replay_on_mismatch())
            .map_err(|e| e.to_string())?;
        let first = engine.begin_round().map_err(|e| e.to_string())?;
        engine.presentation_finished().map_err(|e| e.to_string())?;
        engine.submit_input(&first.sequence[0]).map_err(|e| e.to_string())?;
        let second = engine.begin_round().map_err(|e| e.to_string())?;
        engine.presentation_finished().map_err(|e| e.to_string())?;
        engine.submit_input(&second.sequence[0]).map_err(|e| e.to_string())?;
        let events = engine
            .submit_input(&second.sequence[0])
            .map_err(|e| e.to_string())?;
        let replay = engine.replay_round().map_err(|e| e.to_string())?;
        Ok(events == vec![SessionEvent::RoundFailed { expected: second.sequence[1].clone() }]
            && replay.sequence == second.sequence)
    })();
    results.push(match outcome {
        Ok(ok) => check("scenario_retry_keeps_sequence", ok, "round 2 mismatch then replay"),
        Err(e) => check("scenario_retry_keeps_sequence", false, e),
    });

    results
}

// ── 3. Simulated Players ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SessionRun {
    events: Vec<SessionEvent>,
    successes: usize,
    steps: usize,
    playback_ms: u64,
}

/// Plays one session to completion, checking invariants after every call.
fn play_session<S: ItemSelector>(
    engine: &mut GameSessionEngine<S>,
    rng: &mut StdRng,
    mistake_rate: f64,
) -> Result<SessionRun, String> {
    let mut run = SessionRun::default();
    let mut attempts = 0u32;

    while run.steps < MAX_STEPS {
        run.steps += 1;
        match engine.phase() {
            Phase::AwaitingRound => {
                let reveal = engine
                    .current_level()
                    .map_or(DEFAULT_REVEAL_MILLIS, |l| l.reveal_millis);
                let shown = engine.begin_round().map_err(|e| e.to_string())?;
                run.playback_ms += PlaybackPlan::for_presentation(&shown, &PacingConfig::new(reveal)).total_ms;
                run.events.extend(shown.events);
                engine.presentation_finished().map_err(|e| e.to_string())?;
                attempts = 0;
            }
            Phase::AwaitingInput => {
                let expected = engine
                    .session()
                    .and_then(|s| s.expected_next().cloned())
                    .ok_or("awaiting input with nothing left to enter")?;
                let outcome = if attempts >= MAX_ATTEMPTS_PER_ROUND {
                    engine.time_expired()
                } else if rng.gen_bool(mistake_rate) {
                    let wrong = engine
                        .candidates()
                        .iter()
                        .find(|c| !c.same_as(&expected))
                        .cloned();
                    match wrong {
                        Some(item) => engine.submit_input(&item),
                        None => engine.time_expired(),
                    }
                } else {
                    engine.submit_input(&expected)
                };
                run.events.extend(outcome.map_err(|e| e.to_string())?);
            }
            Phase::RoundFailed => {
                attempts += 1;
                let shown = engine.replay_round().map_err(|e| e.to_string())?;
                run.events.extend(shown.events);
                engine.presentation_finished().map_err(|e| e.to_string())?;
            }
            Phase::Completed => {
                run.successes = run
                    .events
                    .iter()
                    .filter(|e| matches!(e, SessionEvent::RoundSucceeded { .. }))
                    .count();
                return Ok(run);
            }
            phase @ (Phase::Idle | Phase::Presenting) => {
                return Err(format!("player stuck in {:?}", phase));
            }
        }
        check_invariants(engine)?;
    }

    Err(format!("session did not complete within {} steps", MAX_STEPS))
}

fn check_invariants<S: ItemSelector>(engine: &GameSessionEngine<S>) -> Result<(), String> {
    let session = engine.session().ok_or("session vanished")?;
    let level = engine.current_level().ok_or("no current level")?;

    if session.phase.is_round_active() && !session.sequence_matches_round() {
        return Err(format!(
            "sequence length {} != round {} in {:?}",
            session.sequence.len(),
            session.current_round,
            session.phase
        ));
    }
    if session.phase == Phase::AwaitingInput && session.user_input.len() >= session.sequence.len() {
        return Err("input already covers the sequence".into());
    }
    if session.score > level.round_count {
        return Err(format!(
            "level score {} exceeds {} rounds",
            session.score, level.round_count
        ));
    }
    let candidates = engine.candidates();
    if let Some(stray) = session
        .sequence
        .iter()
        .find(|i| !candidates.iter().any(|c| c.same_as(i)))
    {
        return Err(format!("item '{}' not allowed at {}", stray.id, level.name));
    }
    Ok(())
}

fn session_seed(base: u64, index: u32) -> u64 {
    base.wrapping_add(index as u64)
}

fn start_variant(variant: &GameVariant, seed: u64) -> Result<GameSessionEngine, String> {
    let mut engine = GameSessionEngine::with_selector(RandomSelector::seeded(seed));
    engine
        .start(variant.catalog.clone(), variant.levels.clone(), variant.options())
        .map_err(|e| e.to_string())?;
    Ok(engine)
}

fn validate_simulated_play(variant: &GameVariant, args: &Args, mistake_rate: f64) -> Vec<TestResult> {
    println!("--- Simulated Play: {} ---", variant.id);
    let mut results = Vec::new();
    let budget = variant.levels.total_rounds() as usize;

    let mut failures = Vec::new();
    let mut total_score = 0u64;
    let mut cleared_all = 0u32;
    let mut longest_steps = 0usize;
    let mut playback_ms = 0u64;

    for i in 0..args.sessions {
        let seed = session_seed(args.seed, i);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
        let outcome = start_variant(variant, seed).and_then(|mut engine| {
            let run = play_session(&mut engine, &mut rng, mistake_rate)?;
            verify_completed(&engine, &run, budget)?;
            Ok((run, engine.summary()))
        });
        match outcome {
            Ok((run, summary)) => {
                longest_steps = longest_steps.max(run.steps);
                playback_ms += run.playback_ms;
                if let Some(summary) = summary {
                    total_score += summary.total_score as u64;
                    if summary.completed_all_levels {
                        cleared_all += 1;
                    }
                }
            }
            Err(e) => failures.push(format!("seed {}: {}", seed, e)),
        }
    }

    results.push(check(
        format!("{}_sessions_complete", variant.id),
        failures.is_empty(),
        if failures.is_empty() {
            format!("{} sessions, longest {} steps", args.sessions, longest_steps)
        } else {
            format!("{} failures, first: {}", failures.len(), failures[0])
        },
    ));

    if args.sessions > 0 {
        let sessions = args.sessions as f64;
        println!(
            "  avg score {:.2}/{}, {:.1}% cleared every level, avg playback {:.1}s",
            total_score as f64 / sessions,
            budget,
            cleared_all as f64 * 100.0 / sessions,
            playback_ms as f64 / sessions / 1000.0
        );
    }

    // A perfect player must clear every level.
    let perfect = start_variant(variant, args.seed).and_then(|mut engine| {
        let mut rng = StdRng::seed_from_u64(args.seed);
        play_session(&mut engine, &mut rng, 0.0)?;
        engine.summary().ok_or_else(|| "no summary".to_string())
    });
    results.push(match perfect {
        Ok(summary) => check(
            format!("{}_perfect_player", variant.id),
            summary.completed_all_levels && summary.total_score as usize == budget,
            format!("score {}/{}", summary.total_score, budget),
        ),
        Err(e) => check(format!("{}_perfect_player", variant.id), false, e),
    });

    results
}

fn verify_completed<S: ItemSelector>(
    engine: &GameSessionEngine<S>,
    run: &SessionRun,
    budget: usize,
) -> Result<(), String> {
    let session = engine.session().ok_or("no session after completion")?;
    if run.successes > budget {
        return Err(format!("{} successful rounds, budget {}", run.successes, budget));
    }
    let terminal = run.events.iter().filter(|e| e.is_terminal()).count();
    if terminal != 1 {
        return Err(format!("{} GameCompleted events", terminal));
    }
    match run.events.last() {
        Some(SessionEvent::GameCompleted { final_score }) if *final_score == session.total_score => {}
        other => return Err(format!("unexpected last event {:?}", other)),
    }
    let history_total: u32 = session.level_history.iter().map(|l| l.score).sum();
    if history_total != session.total_score {
        return Err(format!(
            "level history sums to {}, total score is {}",
            history_total, session.total_score
        ));
    }
    Ok(())
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(variant: &GameVariant, seed: u64, mistake_rate: f64) -> TestResult {
    let replay = || -> Result<Vec<SessionEvent>, String> {
        let mut engine = start_variant(variant, seed)?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(play_session(&mut engine, &mut rng, mistake_rate)?.events)
    };
    let name = format!("{}_deterministic", variant.id);
    match (replay(), replay()) {
        (Ok(a), Ok(b)) => check(name, a == b, format!("{} events", a.len())),
        (Err(e), _) | (_, Err(e)) => check(name, false, e),
    }
}

// ── 5. Score Report & Snapshot ──────────────────────────────────────────

fn validate_report_and_snapshot(variant: &GameVariant, seed: u64) -> Vec<TestResult> {
    let mut results = Vec::new();

    let report = start_variant(variant, seed).and_then(|mut engine| {
        let mut rng = StdRng::seed_from_u64(seed);
        play_session(&mut engine, &mut rng, 0.1)?;
        let report = ScoreReport::from_engine(&engine, "simtest", &variant.id)
            .ok_or("no report for a completed session")?;
        let json = report.to_json().map_err(|e| e.to_string())?;
        let parsed: ScoreReport = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        Ok((report, parsed, json))
    });
    results.push(match report {
        Ok((report, parsed, json)) => check(
            format!("{}_score_report", variant.id),
            report == parsed && json.contains("\"userId\"") && json.contains("\"gameId\""),
            json,
        ),
        Err(e) => check(format!("{}_score_report", variant.id), false, e),
    });

    // Save mid-round, resume in a fresh engine, finish from there.
    let resumed = start_variant(variant, seed).and_then(|mut engine| {
        engine.begin_round().map_err(|e| e.to_string())?;
        engine.presentation_finished().map_err(|e| e.to_string())?;
        let json = SessionSnapshot::capture(&engine, &variant.id)
            .and_then(|s| s.to_json())
            .map_err(|e| e.to_string())?;
        let snapshot = SessionSnapshot::from_json(&json).map_err(|e| e.to_string())?;

        let mut fresh = GameSessionEngine::with_selector(RandomSelector::seeded(seed ^ 1));
        fresh
            .resume(variant.catalog.clone(), variant.levels.clone(), snapshot.session)
            .map_err(|e| e.to_string())?;
        if fresh.sequence() != engine.sequence() || fresh.phase() != engine.phase() {
            return Err("resumed session differs from saved one".to_string());
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let run = play_session(&mut fresh, &mut rng, 0.0)?;
        Ok(run.steps)
    });
    results.push(match resumed {
        Ok(steps) => check(
            format!("{}_snapshot_resume", variant.id),
            true,
            format!("resumed and finished in {} steps", steps),
        ),
        Err(e) => check(format!("{}_snapshot_resume", variant.id), false, e),
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_accepts_unit_interval() {
        assert_eq!(parse_probability("0"), Ok(0.0));
        assert_eq!(parse_probability("0.15"), Ok(0.15));
        assert_eq!(parse_probability("1"), Ok(1.0));
    }

    #[test]
    fn test_probability_rejects_non_finite_and_out_of_range() {
        for bad in ["NaN", "nan", "inf", "-inf", "1.5", "-0.1", "often"] {
            assert!(parse_probability(bad).is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_cli_rejects_nan_mistake_rate() {
        assert!(Args::try_parse_from(["calmquest-simtest", "--mistake-rate", "NaN"]).is_err());
        let args = Args::try_parse_from(["calmquest-simtest", "--mistake-rate", "0.3"]).unwrap();
        assert_eq!(args.mistake_rate, 0.3);
    }
}
