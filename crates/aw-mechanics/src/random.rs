//! Injectable random sources.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed integers.
pub trait RandomSource: Send {
    /// A value in `min..=max`. Callers guarantee `min <= max`.
    fn gen_range(&mut self, min: i32, max: i32) -> i32;

    /// An index in `0..len`. Returns 0 when `len` is 0.
    fn gen_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let max = i32::try_from(len - 1).unwrap_or(i32::MAX);
        usize::try_from(self.gen_range(0, max)).unwrap_or(0)
    }
}

/// Pseudo-random source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic sequence for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_os()
    }
}

impl RandomSource for SeededRandom {
    fn gen_range(&mut self, min: i32, max: i32) -> i32 {
        self.rng.random_range(min..=max)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
///
/// Each value is clamped into the requested range, so a script of `[5]`
/// always rolls 5 on a d20 and 0 for a two-element pick.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<i32>,
}

impl ScriptedRandom {
    /// Replay `values` in order. An empty script always yields `min`.
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Always the same value.
    pub fn fixed(value: i32) -> Self {
        Self::new([value])
    }
}

impl RandomSource for ScriptedRandom {
    fn gen_range(&mut self, min: i32, max: i32) -> i32 {
        let Some(v) = self.values.pop_front() else {
            return min;
        };
        self.values.push_back(v);
        v.clamp(min, max)
    }
}
