//! RT quantile points and the Cunnane-position quantile estimator.
//!
//! [`Quantiles`] is the validated list of cumulative-probability points the
//! observed vectors are built on (deciles `0.1..=0.9` by default).
//! [`mquantiles`] evaluates them on a sorted sample with plotting positions
//! `alphap = betap = 0.4`:
//!
//! ```text
//! m     = α + p (1 - α - β)
//! aleph = n p + m
//! k     = floor(clip(aleph, 1, n - 1))
//! γ     = clip(aleph - k, 0, 1)
//! q(p)  = (1 - γ) x[k-1] + γ x[k]
//! ```
use serde::{Deserialize, Serialize};

use crate::fitting::errors::{ConfigError, ConfigResult};

const ALPHAP: f64 = 0.4;
const BETAP: f64 = 0.4;

/// `Quantiles` — ascending probability points strictly inside (0, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantiles(Vec<f64>);

impl Quantiles {
    /// Validate and wrap `points`.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::InvalidQuantiles` if `points` is empty, contains a
    ///   non-finite value or one outside (0, 1), or is not strictly
    ///   ascending.
    pub fn new(points: Vec<f64>) -> ConfigResult<Quantiles> {
        if points.is_empty() {
            return Err(ConfigError::InvalidQuantiles { value: f64::NAN, reason: "no quantile points given" });
        }
        for &p in &points {
            if !p.is_finite() || p <= 0.0 || p >= 1.0 {
                return Err(ConfigError::InvalidQuantiles { value: p, reason: "must lie strictly inside (0, 1)" });
            }
        }
        if let Some(w) = points.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidQuantiles { value: w[1], reason: "must be strictly ascending" });
        }
        Ok(Quantiles(points))
    }

    /// Deciles `0.1, 0.2, ..., 0.9`.
    pub fn deciles() -> Quantiles {
        Quantiles((1..10).map(|i| i as f64 / 10.0).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Quantiles {
    fn default() -> Quantiles {
        Quantiles::deciles()
    }
}

/// Quantiles of an ascending-sorted sample at `probs`.
///
/// An empty sample yields NaN at every point; a single observation is
/// returned for every point.
pub fn mquantiles(sorted: &[f64], probs: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    match n {
        0 => vec![f64::NAN; probs.len()],
        1 => vec![sorted[0]; probs.len()],
        _ => probs
            .iter()
            .map(|&p| {
                let m = ALPHAP + p * (1.0 - ALPHAP - BETAP);
                let aleph = n as f64 * p + m;
                let k = aleph.clamp(1.0, (n - 1) as f64).floor();
                let gamma = (aleph - k).clamp(0.0, 1.0);
                let k = k as usize;
                (1.0 - gamma) * sorted[k - 1] + gamma * sorted[k]
            })
            .collect(),
    }
}

/// Sort a copy of `values` and evaluate [`mquantiles`] on it.
pub fn sample_quantiles(values: &[f64], probs: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    mquantiles(&sorted, probs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Check the estimator against hand-computed Cunnane positions.
    //
    // Given
    // -----
    // - Sample 1..=10, probabilities 0.1, 0.5, 0.9.
    //
    // Expect
    // ------
    // - aleph = 1.42 → 1.42; aleph = 5.5 → 5.5; aleph = 9.58 → 9.58.
    fn mquantiles_matches_cunnane_positions() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let q = mquantiles(&x, &[0.1, 0.5, 0.9]);

        assert_relative_eq!(q[0], 1.42, epsilon = 1e-12);
        assert_relative_eq!(q[1], 5.5, epsilon = 1e-12);
        assert_relative_eq!(q[2], 9.58, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check clipping at the sample edges and the degenerate sizes.
    //
    // Given
    // -----
    // - A two-point sample at p = 0.1 (aleph < 1) and p = 0.9 (aleph > n - 1).
    // - Single-point and empty samples.
    //
    // Expect
    // ------
    // - Edge values are clipped to the sample range; one point repeats;
    //   empty gives NaN.
    fn mquantiles_clips_and_handles_small_samples() {
        let q = mquantiles(&[0.3, 0.5], &[0.1, 0.9]);
        assert_relative_eq!(q[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.5, epsilon = 1e-12);

        assert_eq!(mquantiles(&[0.42], &[0.1, 0.5]), vec![0.42, 0.42]);
        assert!(mquantiles(&[], &[0.5])[0].is_nan());
        assert_eq!(sample_quantiles(&[0.5, 0.3], &[0.9]), mquantiles(&[0.3, 0.5], &[0.9]));
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid quantile points are rejected up front.
    //
    // Given
    // -----
    // - Empty, out-of-range and unsorted point lists.
    //
    // Expect
    // ------
    // - `InvalidQuantiles` in every case; deciles are accepted.
    fn quantiles_validate_points() {
        assert!(Quantiles::new(vec![]).is_err());
        assert!(Quantiles::new(vec![0.0, 0.5]).is_err());
        assert!(Quantiles::new(vec![0.5, 1.0]).is_err());
        assert!(matches!(
            Quantiles::new(vec![0.5, 0.3]),
            Err(ConfigError::InvalidQuantiles { value, .. }) if value == 0.3
        ));

        let deciles = Quantiles::deciles();
        assert_eq!(deciles.len(), 9);
        assert_eq!(Quantiles::new(deciles.as_slice().to_vec()).unwrap(), deciles);
    }
}
