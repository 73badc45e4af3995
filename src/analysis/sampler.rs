use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws behind Normal sub-window sampling.
pub trait NormalSampler {
    /// Uniform draw over `1..=10`.
    fn roll(&mut self) -> u32;
    /// Uniform draw over `low..=high`.
    fn window_start(&mut self, low: u64, high: u64) -> u64;
}

pub struct RandomSampler<R: Rng = StdRng> {
    rng: R,
}

impl RandomSampler<StdRng> {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        RandomSampler { rng }
    }
}

impl<R: Rng> NormalSampler for RandomSampler<R> {
    fn roll(&mut self) -> u32 {
        self.rng.random_range(1..=10)
    }

    fn window_start(&mut self, low: u64, high: u64) -> u64 {
        self.rng.random_range(low..=high)
    }
}

/// Replays predetermined draws; rolls past the end are rejected (10).
#[cfg(test)]
pub(crate) struct FixedSampler {
    rolls: std::collections::VecDeque<u32>,
    starts: std::collections::VecDeque<u64>,
    rolls_taken: usize,
    bounds: Vec<(u64, u64)>,
}

#[cfg(test)]
impl FixedSampler {
    pub fn new(rolls: Vec<u32>, starts: Vec<u64>) -> Self {
        FixedSampler {
            rolls: rolls.into(),
            starts: starts.into(),
            rolls_taken: 0,
            bounds: Vec::new(),
        }
    }

    pub fn never() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn rolls_taken(&self) -> usize {
        self.rolls_taken
    }

    pub fn window_bounds(&self) -> Vec<(u64, u64)> {
        self.bounds.clone()
    }
}

#[cfg(test)]
impl NormalSampler for FixedSampler {
    fn roll(&mut self) -> u32 {
        self.rolls_taken += 1;
        self.rolls.pop_front().unwrap_or(10)
    }

    fn window_start(&mut self, low: u64, high: u64) -> u64 {
        self.bounds.push((low, high));
        self.starts.pop_front().unwrap_or(low)
    }
}
