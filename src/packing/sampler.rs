//! Seeded stratified species sampler
//!
//! Each call to [`TypeSampler::next_species`] draws one uniform deviate `u`
//! in `[0, 1)` and maps it onto the cumulative number-fraction thresholds.
//! There is no quota balancing: populations only converge to the resolved
//! fractions statistically.
//!
//! Tie-break rule: a deviate equal to a threshold belongs to the bucket
//! *below* that threshold. The selected species is the number of thresholds
//! strictly smaller than `u`.
//!
//! The stream is a `ChaCha8Rng`, which yields the same sequence on every
//! platform for a given seed. It is seeded once and never reset; callers
//! must draw in a fixed order to stay reproducible.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::packing::states::NVec3;

/// Prefix sums of number fractions, last element ~1.0
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeThresholds {
    bounds: Vec<f64>,
}

impl CumulativeThresholds {
    pub fn from_fractions(fractions: &[f64]) -> Self {
        let total: f64 = fractions.iter().sum();
        let mut acc = 0.0;
        let bounds = fractions
            .iter()
            .map(|f| {
                acc += f / total;
                acc
            })
            .collect();
        Self { bounds }
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Species index for the deviate `u`
    ///
    /// Counts thresholds strictly below `u`, so `u == bound` stays in the
    /// lower bucket. Empty buckets (zero fraction) are skipped upward, and
    /// the result is clamped to the last species to absorb round-off in the
    /// final sum. An empty bucket reached by the clamp gives way to the
    /// nearest non-empty one below it.
    pub fn species_for(&self, u: f64) -> usize {
        let last = self.bounds.len().saturating_sub(1);
        let mut index = self
            .bounds
            .iter()
            .filter(|&&bound| u > bound)
            .count()
            .min(last);

        let lower = |i: usize| if i == 0 { 0.0 } else { self.bounds[i - 1] };
        while index < last && self.bounds[index] <= lower(index) {
            index += 1;
        }
        while index > 0 && self.bounds[index] <= lower(index) {
            index -= 1;
        }
        index
    }
}

/// Assigns species to successive slots from a single seeded stream
#[derive(Debug, Clone)]
pub struct TypeSampler {
    rng: ChaCha8Rng,
    thresholds: CumulativeThresholds,
}

impl TypeSampler {
    pub fn new(seed: u64, thresholds: CumulativeThresholds) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            thresholds,
        }
    }

    pub fn from_fractions(seed: u64, fractions: &[f64]) -> Self {
        Self::new(seed, CumulativeThresholds::from_fractions(fractions))
    }

    pub fn thresholds(&self) -> &CumulativeThresholds {
        &self.thresholds
    }

    /// One uniform draw in [0, 1) from the shared stream
    pub fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn next_species(&mut self) -> usize {
        let u = self.next_unit();
        self.thresholds.species_for(u)
    }

    /// Euler angles in [0, 2pi), drawn x, then y, then z
    pub fn next_rotation(&mut self) -> NVec3 {
        let x = self.rng.gen_range(0.0..TAU);
        let y = self.rng.gen_range(0.0..TAU);
        let z = self.rng.gen_range(0.0..TAU);
        NVec3::new(x, y, z)
    }
}
