//! Observed data — per-unit summary vectors and cost weights.
//!
//! Purpose
//! -------
//! Aggregate validated trials into the vectors a weighted least-squares
//! cost compares simulated predictions against. Each fit unit (one pooled
//! `"avg"` unit or one unit per subject) gets four aligned artifacts:
//!
//! - `observed_flat` / `flat_wts`: statistics collapsed across conditions,
//!   length `ncols = 1 + nquantiles`.
//! - `observed` / `cond_wts`: the same statistics per level combo,
//!   concatenated in combo order, length `ncols * nlevels`.
//!
//! plus the bootstrap standard errors (`observed_err`,
//! `observed_flat_err`) the weights are derived from.
//!
//! Key behaviors
//! -------------
//! - Statistics per group: go-trial response proportion, then the
//!   configured quantiles of correct go RTs (Cunnane positions).
//! - Sparse combos degrade instead of failing. Fewer than `min_trials` go
//!   trials: computed from what is there ([`SparsityFill::Partial`]). No go
//!   trials or no correct RT: filled with the unit's flat statistics
//!   ([`SparsityFill::FlatFallback`]). Every case is logged and collected
//!   in [`ObservedData::sparsity`].
//! - Bootstrap streams are seeded per (unit, combo), so a rebuild with the
//!   same inputs is bit-identical.
//!
//! Invariants & assumptions
//! ------------------------
//! - `observed[i].len() == cond_wts[i].len() == ncols * nlevels`.
//! - `observed_flat[i].len() == flat_wts[i].len() == ncols`.
//! - The condition set was derived from the same (prepared) data.
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fitting::{
    core::{
        conditions::ConditionSet,
        data::{TrialData, TrialType},
        options::{AVG_UNIT, FitOn, ObservedOptions},
        weights::{GoOutcome, bootstrap_se, inverse_se_weights, stream_rng, summarize},
    },
    errors::{ConfigError, ConfigResult, DataError, FitResult},
};

/// How a sparse combo was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SparsityFill {
    /// Fewer than `min_trials` go trials; statistics computed from the
    /// available ones.
    Partial,
    /// No go trials or no correct RT; the unit's flat statistics were used.
    FlatFallback,
}

/// Non-fatal report of an under-populated (unit, combo) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparsityFlag {
    pub unit: String,
    pub combo: String,
    pub ngo: usize,
    pub fill: SparsityFill,
}

/// `ObservedData` — aligned observed, error and weight vectors per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedData {
    units: Vec<String>,
    ncols: usize,
    nlevels: usize,
    observed: Vec<Array1<f64>>,
    observed_err: Vec<Array1<f64>>,
    cond_wts: Vec<Array1<f64>>,
    observed_flat: Vec<Array1<f64>>,
    observed_flat_err: Vec<Array1<f64>>,
    flat_wts: Vec<Array1<f64>>,
    sparsity: Vec<SparsityFlag>,
}

struct UnitStats {
    observed: Vec<f64>,
    observed_err: Vec<f64>,
    flat: Vec<f64>,
    flat_err: Vec<f64>,
}

impl ObservedData {
    /// Build observed data for every unit of `data`.
    ///
    /// Parameters
    /// ----------
    /// - `data`: prepared trials (carrying the `"flat"` factor when the
    ///   configuration is flat).
    /// - `conditions`: combo layout the conditional vectors follow.
    /// - `options`: quantiles, granularity, weighting and bootstrap knobs.
    ///
    /// Errors
    /// ------
    /// - Option validation errors (`ConfigError`).
    /// - `DataError::EmptySubjectGroup` when a unit has no correct go RT at
    ///   all, so not even flat statistics exist.
    pub fn build(data: &TrialData, conditions: &ConditionSet, options: &ObservedOptions) -> FitResult<ObservedData> {
        options.validate()?;

        let units: Vec<String> = match options.fit_on {
            FitOn::Average => vec![AVG_UNIT.to_string()],
            FitOn::Subjects => data.subjects().to_vec(),
        };
        let ncols = options.ncols();
        let nlevels = conditions.nlevels();
        let tags = conditions.level_tags();

        let mut out = ObservedData {
            units: units.clone(),
            ncols,
            nlevels,
            observed: Vec::with_capacity(units.len()),
            observed_err: Vec::with_capacity(units.len()),
            cond_wts: Vec::with_capacity(units.len()),
            observed_flat: Vec::with_capacity(units.len()),
            observed_flat_err: Vec::with_capacity(units.len()),
            flat_wts: Vec::with_capacity(units.len()),
            sparsity: Vec::new(),
        };

        for (u, unit) in units.iter().enumerate() {
            let mut groups: Vec<Vec<GoOutcome>> = vec![Vec::new(); nlevels];
            let mut pooled: Vec<GoOutcome> = Vec::new();
            let unit_trials = data.trials().iter().filter(|t| match options.fit_on {
                FitOn::Average => true,
                FitOn::Subjects => t.subject == *unit,
            });
            for trial in unit_trials.filter(|t| t.ttype == TrialType::Go) {
                let outcome = if trial.response { trial.rt } else { None };
                pooled.push(outcome);
                if let Some(ix) = conditions.combo_index(trial) {
                    groups[ix].push(outcome);
                }
            }

            let stats = unit_stats(u, unit, &pooled, &groups, &tags, options, &mut out.sparsity)?;
            let (cond_wts, flat_wts) = if options.weighted {
                (
                    inverse_se_weights(&stats.observed_err, options.variance_floor),
                    inverse_se_weights(&stats.flat_err, options.variance_floor),
                )
            } else {
                (Array1::ones(ncols * nlevels), Array1::ones(ncols))
            };

            out.observed.push(Array1::from(stats.observed));
            out.observed_err.push(Array1::from(stats.observed_err));
            out.cond_wts.push(cond_wts);
            out.observed_flat.push(Array1::from(stats.flat));
            out.observed_flat_err.push(Array1::from(stats.flat_err));
            out.flat_wts.push(flat_wts);
        }

        info!(units = out.units.len(), nlevels, ncols, sparse = out.sparsity.len(), "built observed data");
        Ok(out)
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn nunits(&self) -> usize {
        self.units.len()
    }

    /// Statistics per combo: accuracy plus one per quantile.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nlevels(&self) -> usize {
        self.nlevels
    }

    pub fn observed(&self) -> &[Array1<f64>] {
        &self.observed
    }

    pub fn observed_err(&self) -> &[Array1<f64>] {
        &self.observed_err
    }

    pub fn cond_wts(&self) -> &[Array1<f64>] {
        &self.cond_wts
    }

    pub fn observed_flat(&self) -> &[Array1<f64>] {
        &self.observed_flat
    }

    pub fn observed_flat_err(&self) -> &[Array1<f64>] {
        &self.observed_flat_err
    }

    pub fn flat_wts(&self) -> &[Array1<f64>] {
        &self.flat_wts
    }

    /// Sparse cells met during the build, in unit then combo order.
    pub fn sparsity(&self) -> &[SparsityFlag] {
        &self.sparsity
    }

    /// `(y, wts)` of unit `ix`, conditional when `nlevels > 1`, flat
    /// otherwise.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::IndexOutOfRange` if `ix >= nunits()`.
    pub fn select(&self, ix: usize, nlevels: usize) -> ConfigResult<(Array1<f64>, Array1<f64>)> {
        if ix >= self.units.len() {
            return Err(ConfigError::IndexOutOfRange { ix, len: self.units.len() });
        }
        if nlevels > 1 {
            Ok((self.observed[ix].clone(), self.cond_wts[ix].clone()))
        } else {
            Ok((self.observed_flat[ix].clone(), self.flat_wts[ix].clone()))
        }
    }
}

fn unit_stats(
    u: usize, unit: &str, pooled: &[GoOutcome], groups: &[Vec<GoOutcome>], tags: &[String],
    options: &ObservedOptions, sparsity: &mut Vec<SparsityFlag>,
) -> FitResult<UnitStats> {
    let probs = options.quantiles.as_slice();
    if !pooled.iter().any(Option::is_some) {
        return Err(DataError::EmptySubjectGroup { unit: unit.to_string() }.into());
    }

    let flat = summarize(pooled, probs);
    let flat_err = bootstrap_se(pooled, probs, options.n_boot, &mut stream_rng(options.seed, u, groups.len()));

    let mut observed = Vec::with_capacity(options.ncols() * groups.len());
    let mut observed_err = Vec::with_capacity(options.ncols() * groups.len());
    for (slot, (group, tag)) in groups.iter().zip(tags).enumerate() {
        let ngo = group.len();
        let has_rt = group.iter().any(Option::is_some);

        let fill = if ngo == 0 || !has_rt {
            Some(SparsityFill::FlatFallback)
        } else if ngo < options.min_trials {
            Some(SparsityFill::Partial)
        } else {
            None
        };

        match fill {
            Some(SparsityFill::FlatFallback) => {
                observed.extend_from_slice(&flat);
                observed_err.extend_from_slice(&flat_err);
            }
            _ => {
                observed.extend(summarize(group, probs));
                let mut rng = stream_rng(options.seed, u, slot);
                observed_err.extend(bootstrap_se(group, probs, options.n_boot, &mut rng));
            }
        }

        if let Some(fill) = fill {
            warn!(unit, combo = tag.as_str(), ngo, ?fill, "sparse condition cell");
            sparsity.push(SparsityFlag { unit: unit.to_string(), combo: tag.clone(), ngo, fill });
        }
    }
    debug!(unit, ntrials = pooled.len(), "summarized unit");

    Ok(UnitStats { observed, observed_err, flat, flat_err })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::{
        core::{conditions::DependsOn, data::Trial, quantiles::Quantiles},
        errors::FitError,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Vector shapes for flat and conditional layouts, per unit mode.
    // - The sparsity policy (partial data and flat fallback).
    // - Uniform weights when weighting is disabled.
    // - Bit-identical rebuilds.
    //
    // They intentionally DO NOT cover:
    // - Quantile and bootstrap arithmetic, covered in `quantiles`/`weights`.
    // -------------------------------------------------------------------------

    fn go_trials(subject: &str, cond: &str, n: usize, base: f64) -> Vec<Trial> {
        (0..n)
            .map(|i| {
                let responded = i % 10 != 0;
                Trial::go(subject, responded, Some(base + 0.002 * i as f64)).with_factor("cond", cond)
            })
            .collect()
    }

    fn options(fit_on: FitOn) -> ObservedOptions {
        ObservedOptions { fit_on, n_boot: 50, ..ObservedOptions::default() }
    }

    #[test]
    // Purpose
    // -------
    // Verify shapes in subjects mode with two conditions.
    //
    // Given
    // -----
    // - 2 subjects × {easy, hard} × 50 go trials, deciles, `{v: cond}`.
    //
    // Expect
    // ------
    // - 2 units; conditional length 20, flat length 10; 90% accuracy.
    fn build_shapes_follow_combos_and_units() {
        let mut trials = Vec::new();
        for s in ["s1", "s2"] {
            trials.extend(go_trials(s, "easy", 50, 0.40));
            trials.extend(go_trials(s, "hard", 50, 0.45));
        }
        let data = TrialData::new(trials, 0.65).unwrap();
        let cset = ConditionSet::new(&data, &DependsOn::new().with("v", "cond")).unwrap();

        let od = ObservedData::build(&data, &cset, &options(FitOn::Subjects)).unwrap();

        assert_eq!(od.units(), &["s1".to_string(), "s2".to_string()]);
        assert_eq!(od.observed()[0].len(), 20);
        assert_eq!(od.cond_wts()[1].len(), 20);
        assert_eq!(od.observed_flat()[0].len(), 10);
        assert_eq!(od.observed()[0][0], 0.9);
        assert!(od.sparsity().is_empty());
        assert!(od.select(2, 2).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Verify the sparsity policy: partial data and flat fallback are
    // flagged rather than raised.
    //
    // Given
    // -----
    // - Subject s1 complete; subject s2 with 5 easy trials and no hard
    //   trials; `min_trials = 10`.
    //
    // Expect
    // ------
    // - s2/easy flagged `Partial`, s2/hard flagged `FlatFallback` with its
    //   slice equal to s2's flat vector.
    fn sparse_cells_are_flagged_not_raised() {
        let mut trials = go_trials("s1", "easy", 30, 0.40);
        trials.extend(go_trials("s1", "hard", 30, 0.45));
        trials.extend(go_trials("s2", "easy", 5, 0.40));
        let data = TrialData::new(trials, 0.65).unwrap();
        let cset = ConditionSet::new(&data, &DependsOn::new().with("v", "cond")).unwrap();

        let od = ObservedData::build(&data, &cset, &options(FitOn::Subjects)).unwrap();
        let flags = od.sparsity();

        assert_eq!(flags.len(), 2);
        assert_eq!((flags[0].combo.as_str(), flags[0].fill), ("easy", SparsityFill::Partial));
        assert_eq!((flags[1].combo.as_str(), flags[1].fill), ("hard", SparsityFill::FlatFallback));
        assert_eq!(flags[1].ngo, 0);
        assert_eq!(od.observed()[1].slice(ndarray::s![10..]), od.observed_flat()[1]);
    }

    #[test]
    // Purpose
    // -------
    // Verify unweighted builds, rebuild determinism, and the empty-unit
    // error.
    //
    // Given
    // -----
    // - Pooled data built twice with identical options; once unweighted;
    //   and a subject whose go trials are all omissions.
    //
    // Expect
    // ------
    // - Identical rebuilds; all-ones weights when unweighted;
    //   `EmptySubjectGroup` for the omission-only subject.
    fn rebuilds_are_identical_and_empty_units_fail() {
        let mut trials = go_trials("s1", "easy", 40, 0.40);
        trials.extend(go_trials("s1", "hard", 40, 0.45));
        let data = TrialData::new(trials, 0.65).unwrap();
        let cset = ConditionSet::new(&data, &DependsOn::new().with("v", "cond")).unwrap();
        let quantiles = Quantiles::new(vec![0.3, 0.5, 0.7]).unwrap();
        let opts = ObservedOptions { quantiles, ..options(FitOn::Average) };

        let a = ObservedData::build(&data, &cset, &opts).unwrap();
        let b = ObservedData::build(&data, &cset, &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ncols(), 4);

        let unweighted_opts = ObservedOptions { weighted: false, ..opts.clone() };
        let unweighted = ObservedData::build(&data, &cset, &unweighted_opts).unwrap();
        assert!(unweighted.cond_wts()[0].iter().all(|&w| w == 1.0));
        assert_eq!(unweighted.observed(), a.observed());

        let omissions =
            TrialData::new(vec![Trial::go("s9", false, None).with_factor("cond", "easy")], 0.65).unwrap();
        let cset = ConditionSet::new(&omissions, &DependsOn::new().with("v", "cond")).unwrap();
        assert_eq!(
            ObservedData::build(&omissions, &cset, &opts).unwrap_err(),
            FitError::Data(DataError::EmptySubjectGroup { unit: "avg".to_string() })
        );
    }
}
