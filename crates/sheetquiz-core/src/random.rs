//! Injectable randomness for option shuffling and question ids.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Source of randomness used by the normalizer and the bank loader.
///
/// Production code uses [`ThreadRandom`]; tests pass [`SeededRandom`] or a
/// scripted implementation to get reproducible orderings.
pub trait RandomSource: Send {
    /// A uniformly distributed index in `0..upper`. `upper` is never zero.
    fn below(&mut self, upper: usize) -> usize;

    /// A random token used to build globally unique question ids.
    fn token(&mut self) -> String;
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&mut self, upper: usize) -> usize {
        rand::rng().random_range(0..upper)
    }

    fn token(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic randomness from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }

    fn token(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.random())
            .into_uuid()
            .to_string()
    }
}

/// Shuffle a slice in place with Fisher–Yates.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}
