//! Summary statistics of one trial group, their bootstrap standard errors,
//! and the cost-function weights derived from them.
//!
//! A group is a list of go-trial outcomes: `Some(rt)` for a correct go
//! response, `None` for an omission. Its summary vector is
//! `[accuracy, q(p_1), ..., q(p_k)]` with quantiles of the correct RTs.
//!
//! Weights are `1 / sqrt(max(se², floor))`, rescaled to unit mean so that
//! their overall scale does not depend on the number of trials.
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::fitting::core::quantiles::sample_quantiles;

/// One go-trial outcome: the RT of a correct response, or `None`.
pub type GoOutcome = Option<f64>;

/// `[accuracy, quantiles...]` of a non-empty group.
///
/// Quantile entries are NaN when the group has no correct response.
pub fn summarize(outcomes: &[GoOutcome], probs: &[f64]) -> Vec<f64> {
    let rts: Vec<f64> = outcomes.iter().flatten().copied().collect();
    let accuracy = rts.len() as f64 / outcomes.len() as f64;
    let mut stats = Vec::with_capacity(1 + probs.len());
    stats.push(accuracy);
    stats.extend(sample_quantiles(&rts, probs));
    stats
}

/// Bootstrap standard error of every entry of [`summarize`].
///
/// Each of the `n_boot` replicates resamples the group with replacement.
/// Replicates without a correct response contribute to the accuracy entry
/// only. Entries with fewer than two usable replicates get an error of 0,
/// which the variance floor later bounds.
pub fn bootstrap_se(outcomes: &[GoOutcome], probs: &[f64], n_boot: usize, rng: &mut SmallRng) -> Vec<f64> {
    use statrs::statistics::Statistics;

    let n = outcomes.len();
    if n == 0 {
        return vec![0.0; 1 + probs.len()];
    }
    let mut replicates: Vec<Vec<f64>> = vec![Vec::with_capacity(n_boot); 1 + probs.len()];
    let mut resample: Vec<GoOutcome> = Vec::with_capacity(n);

    for _ in 0..n_boot {
        resample.clear();
        resample.extend((0..n).map(|_| outcomes[rng.random_range(0..n)]));
        for (column, value) in replicates.iter_mut().zip(summarize(&resample, probs)) {
            if value.is_finite() {
                column.push(value);
            }
        }
    }

    replicates
        .iter()
        .map(|column| if column.len() < 2 { 0.0 } else { column.iter().std_dev() })
        .collect()
}

/// Seed of the bootstrap stream of (`unit`, `slot`) derived from `seed`.
///
/// Streams are independent of the order in which groups are visited, so a
/// rebuild with the same inputs reproduces every vector exactly.
pub fn stream_seed(seed: u64, unit: usize, slot: usize) -> u64 {
    let u = (unit as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let s = (slot as u64).wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    seed ^ u ^ s.rotate_left(31)
}

/// Seeded generator for (`unit`, `slot`).
pub fn stream_rng(seed: u64, unit: usize, slot: usize) -> SmallRng {
    SmallRng::seed_from_u64(stream_seed(seed, unit, slot))
}

/// Unit-mean inverse standard-error weights with variance floor `floor`.
pub fn inverse_se_weights(se: &[f64], floor: f64) -> Array1<f64> {
    let raw: Array1<f64> = se.iter().map(|s| 1.0 / (s * s).max(floor).sqrt()).collect();
    match raw.mean() {
        Some(mean) if mean > 0.0 && mean.is_finite() => raw / mean,
        _ => Array1::ones(se.len()),
    }
}
