//! Swappable random source for option shuffling.
//!
//! Production uses a seeded or entropy-backed `StdRng`; tests script the
//! draws so permutation checks are deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform integer in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;
}

pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn from_entropy() -> Self {
        StdRandom(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        StdRandom(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for StdRandom {
    fn below(&mut self, bound: usize) -> usize {
        self.0.gen_range(0..bound)
    }
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T>(rng: &mut dyn RandomSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// Replays a fixed list of draws (clamped into range), cycling when exhausted.
#[cfg(test)]
pub struct ScriptedRandom {
    draws: Vec<usize>,
    pos: usize,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(draws: &[usize]) -> Self {
        ScriptedRandom { draws: draws.to_vec(), pos: 0 }
    }

    /// Always draws 0.
    pub fn zeros() -> Self {
        Self::new(&[0])
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn below(&mut self, bound: usize) -> usize {
        let v = self.draws.get(self.pos).copied().unwrap_or(0);
        self.pos = (self.pos + 1) % self.draws.len().max(1);
        v % bound
    }
}
