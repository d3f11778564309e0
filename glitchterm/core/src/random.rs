//! Random Source
//!
//! Every effect in the terminal is driven by coin flips: typing stutter,
//! per-character glitch markers, line corruption and picking which hidden
//! item to reveal. Randomness is a capability handed to the engine rather
//! than a global, so tests can swap in a seeded or fixed generator.
//!
//! Any [`rand::RngCore`] is a [`RandomSource`] through the blanket impl, so
//! `StdRng::seed_from_u64(..)` or `rand::rngs::mock::StepRng` plug in
//! directly.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A source of probabilistic decisions
pub trait RandomSource: Send {
    /// Returns `true` with the given probability (clamped to `0.0..=1.0`)
    fn chance(&mut self, probability: f64) -> bool;

    /// Returns a uniformly chosen index in `0..len`
    ///
    /// Returns 0 when `len` is 0 or 1.
    fn index(&mut self, len: usize) -> usize;
}

impl<R: RngCore + Send> RandomSource for R {
    fn chance(&mut self, probability: f64) -> bool {
        // NaN and non-positive probabilities never fire
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.gen_bool(probability)
    }

    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.gen_range(0..len)
        }
    }
}

/// Cloneable handle to a shared random source
///
/// The lock is only ever held for a single decision, never across an await.
#[derive(Clone)]
pub struct SharedRandom {
    inner: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl SharedRandom {
    /// Wrap an arbitrary random source
    pub fn new(source: impl RandomSource + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(source))),
        }
    }

    /// Unseeded generator for production use
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible runs
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// See [`RandomSource::chance`]
    pub fn chance(&self, probability: f64) -> bool {
        self.inner.lock().chance(probability)
    }

    /// See [`RandomSource::index`]
    pub fn index(&self, len: usize) -> usize {
        self.inner.lock().index(len)
    }

    /// Run several decisions under one lock
    pub fn with<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut guard = self.inner.lock();
        f(guard.as_mut())
    }
}

impl Default for SharedRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for SharedRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRandom").finish_non_exhaustive()
    }
}
