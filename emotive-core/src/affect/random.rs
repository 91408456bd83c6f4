//! Injectable randomness for response choice and the extreme gate

use std::collections::VecDeque;

/// Source of the random draws made by the affect layer
pub trait RandomSource: Send {
    /// Uniform draw in `(0.0, 1.0]`
    fn unit(&mut self) -> f32;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;
}

/// Uniformly pick one item; `None` for an empty slice
pub fn choose<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.index(items.len()))
}

/// Production randomness backed by `fastrand`
#[derive(Debug, Clone)]
pub struct FastRandom {
    rng: fastrand::Rng,
}

impl FastRandom {
    /// Seed from the OS
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Fixed seed, reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for FastRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for FastRandom {
    fn unit(&mut self) -> f32 {
        // f32() is [0, 1); flip it so a draw of exactly zero cannot happen
        1.0 - self.rng.f32()
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.usize(..len)
    }
}

/// Replays a fixed script of draws; used by tests to pin down choices
///
/// When a queue runs dry the last value is repeated (`1.0` / `0` if the
/// queue was empty from the start).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    units: VecDeque<f32>,
    indices: VecDeque<usize>,
    last_unit: Option<f32>,
    last_index: Option<usize>,
}

impl ScriptedRandom {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue draws for [`RandomSource::unit`]
    pub fn with_units(mut self, units: impl IntoIterator<Item = f32>) -> Self {
        self.units.extend(units);
        self
    }

    /// Queue draws for [`RandomSource::index`]
    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f32 {
        if let Some(next) = self.units.pop_front() {
            self.last_unit = Some(next);
        }
        self.last_unit.unwrap_or(1.0)
    }

    fn index(&mut self, len: usize) -> usize {
        if let Some(next) = self.indices.pop_front() {
            self.last_index = Some(next);
        }
        self.last_index.unwrap_or(0) % len.max(1)
    }
}
