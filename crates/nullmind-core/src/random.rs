//! Seeded random numbers for the simulation.
//!
//! All gameplay randomness goes through one [`GameRng`] so that a seed plus
//! the recorded input reproduces a run exactly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Deterministic random number generator (PCG32).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    inner: Pcg32,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[min, max]`, both inclusive. Swapped bounds are
    /// accepted.
    pub fn rand_int(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform float in `[min, max]`. Swapped bounds are accepted.
    ///
    /// A NaN or infinite bound yields the other bound if it is finite, or
    /// `0.0`. Spans wider than `f32::MAX` are sampled in `f64`.
    pub fn rand_float(&mut self, min: f32, max: f32) -> f32 {
        match (min.is_finite(), max.is_finite()) {
            (true, true) => {}
            (true, false) => return min,
            (false, true) => return max,
            (false, false) => return 0.0,
        }
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if (hi - lo).is_finite() {
            return self.inner.gen_range(lo..=hi);
        }
        let t: f64 = self.inner.gen();
        (lo as f64 + (hi as f64 - lo as f64) * t) as f32
    }

    /// Fair coin flip.
    pub fn rand_bool(&mut self) -> bool {
        self.inner.gen_bool(0.5)
    }

    /// Pick one element of `items` uniformly; `None` when empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.inner.gen_range(0..items.len());
        items.get(idx)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
