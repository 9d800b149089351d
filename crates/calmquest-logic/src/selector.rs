//! Item selection: the engine's only source of randomness.
//!
//! The engine never rolls dice itself; it asks an [`ItemSelector`] to pick the
//! next item of the sequence. Production uses [`RandomSelector`], tests use a
//! seeded `RandomSelector` or a [`ScriptedSelector`] that forces an exact
//! sequence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::Item;

/// Picks one item out of a non-empty candidate list.
pub trait ItemSelector {
    /// `candidates` is never empty; the engine validates levels up front.
    fn pick_one<'a>(&mut self, candidates: &'a [Item]) -> &'a Item;
}

impl<S: ItemSelector + ?Sized> ItemSelector for Box<S> {
    fn pick_one<'a>(&mut self, candidates: &'a [Item]) -> &'a Item {
        (**self).pick_one(candidates)
    }
}

/// Uniform random selection over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    /// Deterministic selector; same seed, same sequences.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RandomSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl Default for RandomSelector<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> ItemSelector for RandomSelector<R> {
    fn pick_one<'a>(&mut self, candidates: &'a [Item]) -> &'a Item {
        match candidates.choose(&mut self.rng) {
            Some(item) => item,
            None => &candidates[0],
        }
    }
}

/// Replays a fixed list of item ids, cycling when exhausted.
///
/// If the scripted id is not among the candidates the first candidate is
/// returned instead and a warning is logged.
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    script: Vec<String>,
    cursor: usize,
}

impl ScriptedSelector {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: ids.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    /// Number of picks made so far.
    pub fn picks(&self) -> usize {
        self.cursor
    }
}

impl ItemSelector for ScriptedSelector {
    fn pick_one<'a>(&mut self, candidates: &'a [Item]) -> &'a Item {
        if self.script.is_empty() {
            return &candidates[0];
        }
        let wanted = &self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        match candidates.iter().find(|item| item.id == *wanted) {
            Some(item) => item,
            None => {
                log::warn!(
                    "scripted item '{}' is not a candidate, using '{}'",
                    wanted,
                    candidates[0].id
                );
                &candidates[0]
            }
        }
    }
}
