//! Randomness for crash points and tick increments.
//!
//! The engine never calls a RNG crate directly; everything goes through
//! the `RandomSource` seam so tests can inject deterministic sources and
//! a future verifiable-fairness authority can be slotted in without
//! touching the round logic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Lower bound of the crash-point distribution.
pub const CRASH_POINT_MIN: f64 = 1.2;
/// Width of the crash-point distribution; crash points land in [1.2, 9.2).
pub const CRASH_POINT_SPAN: f64 = 8.0;
/// Lower bound of the per-round tick increment.
pub const INCREMENT_MIN: f64 = 0.05;
/// Width of the per-round tick increment; increments land in [0.05, 0.20).
pub const INCREMENT_SPAN: f64 = 0.15;

/// Supplier of uniform random values in [0, 1).
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Sample a crash point, uniform on [1.2, 9.2).
pub fn sample_crash_point(rng: &mut dyn RandomSource) -> f64 {
    CRASH_POINT_MIN + rng.next_unit() * CRASH_POINT_SPAN
}

/// Sample a per-round tick increment, uniform on [0.05, 0.20).
///
/// Sampled once at round start and reused for every tick of that round.
pub fn sample_increment(rng: &mut dyn RandomSource) -> f64 {
    INCREMENT_MIN + rng.next_unit() * INCREMENT_SPAN
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Production source backed by the thread-local OS-seeded RNG.
#[derive(Debug, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic ChaCha-based source for tests and simulations.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Source that replays a fixed sequence of unit values, then repeats the
/// last one. Lets tests pin the exact crash point and increment of a round.
#[derive(Debug, Clone)]
pub struct FixedSource {
    values: Vec<f64>,
    next: usize,
}

impl FixedSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "FixedSource needs at least one value");
        Self { values, next: 0 }
    }
}

impl RandomSource for FixedSource {
    fn next_unit(&mut self) -> f64 {
        let v = self.values[self.next.min(self.values.len() - 1)];
        self.next += 1;
        v
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
