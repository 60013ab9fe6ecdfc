//! Injectable randomness.
//!
//! The engine draws random numbers in exactly two places: the combat damage
//! jitter and the AI's tie-breaking choices. Both go through
//! [`RandomSource`], so a seeded or fully scripted source makes a whole match
//! reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of the engine's random decisions.
pub trait RandomSource {
    /// Uniform integer in `low..=high`.
    fn roll(&mut self, low: i32, high: i32) -> i32;

    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;

    /// Fair coin flip.
    fn chance_half(&mut self) -> bool;
}

/// Seeded ChaCha8 random source.
#[derive(Debug, Clone)]
pub struct SeededDice {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededDice {
    /// Create a source from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create a source from an OS-drawn seed.
    ///
    /// The seed is kept so a surprising match can be replayed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Seed this source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededDice {
    fn roll(&mut self, low: i32, high: i32) -> i32 {
        self.rng.gen_range(low..=high)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn chance_half(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}
