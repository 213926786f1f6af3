//! Fit options — model kind, fit granularity and observed-data knobs.
//!
//! Purpose
//! -------
//! Collect the configuration surface consumed when a fit model is built so
//! that every knob is validated at configuration time instead of failing
//! later inside the optimizer or simulator.
//!
//! Key behaviors
//! -------------
//! - [`ModelKind`] validates the model-family tag (`dpm`, `race`, `iact`,
//!   `pro`, optionally prefixed, e.g. `xdpm`, `irace`).
//! - [`FitOn`] selects the unit granularity: one pooled `"avg"` unit or one
//!   unit per subject.
//! - [`Force`] overrides whether the active fit targets conditional or flat
//!   vectors.
//! - [`ObservedOptions`] bundles the quantile points, weighting switch,
//!   sparsity threshold and bootstrap settings used to build observed data.
//!
//! Conventions
//! -----------
//! - String forms parse case-sensitively and match the names used in model
//!   ids and exported records.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fitting::{
    core::quantiles::Quantiles,
    errors::{ConfigError, ConfigResult},
};

/// Unit label of the pooled fit.
pub const AVG_UNIT: &str = "avg";

/// Default minimum number of go trials per combo before a combo is flagged.
pub const DEFAULT_MIN_TRIALS: usize = 10;

/// Default number of bootstrap resamples per statistic.
pub const DEFAULT_N_BOOT: usize = 500;

/// Default variance floor for weight computation.
pub const DEFAULT_VARIANCE_FLOOR: f64 = 1e-8;

/// Fit granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitOn {
    /// All subjects pooled into one unit, `"avg"`.
    Average,
    /// One unit per subject.
    Subjects,
}

impl FitOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitOn::Average => "average",
            FitOn::Subjects => "subjects",
        }
    }

    /// Short tag used in model ids.
    pub fn id_tag(&self) -> &'static str {
        match self {
            FitOn::Average => AVG_UNIT,
            FitOn::Subjects => "idx",
        }
    }
}

impl FromStr for FitOn {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<FitOn> {
        match s {
            "average" => Ok(FitOn::Average),
            "subjects" => Ok(FitOn::Subjects),
            _ => Err(ConfigError::InvalidFitOn { name: s.to_string() }),
        }
    }
}

impl fmt::Display for FitOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Override of the active level count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Force {
    /// Target conditional vectors (`nlevels` of the condition set).
    Cond,
    /// Target flat vectors (`nlevels == 1`).
    Flat,
}

impl FromStr for Force {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Force> {
        match s {
            "cond" => Ok(Force::Cond),
            "flat" => Ok(Force::Flat),
            _ => Err(ConfigError::InvalidForce { name: s.to_string() }),
        }
    }
}

/// `ModelKind` — validated model-family tag.
///
/// The tag is kept verbatim; predicates test for substrings the same way
/// model variants are named (`xdpm` is a dpm with the `xb` dynamic term,
/// `irace` an independent race with a positive stop drift).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelKind(String);

impl ModelKind {
    /// Errors
    /// ------
    /// - `ConfigError::InvalidKind` if the tag names none of `dpm`, `race`,
    ///   `iact`, `pro`.
    pub fn new(kind: impl Into<String>) -> ConfigResult<ModelKind> {
        let kind = kind.into();
        if ["dpm", "race", "iact", "pro"].iter().any(|family| kind.contains(family)) {
            Ok(ModelKind(kind))
        } else {
            Err(ConfigError::InvalidKind { kind })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_dpm(&self) -> bool {
        self.0.contains("dpm")
    }

    pub fn is_race(&self) -> bool {
        self.0.contains("race")
    }

    pub fn is_irace(&self) -> bool {
        self.0.contains("irace")
    }

    pub fn is_iact(&self) -> bool {
        self.0.contains("iact")
    }

    pub fn is_pro(&self) -> bool {
        self.0.contains("pro")
    }

    /// Whether the model carries the dynamic `xb` term.
    pub fn is_dynamic(&self) -> bool {
        self.0.contains('x')
    }
}

impl Default for ModelKind {
    fn default() -> ModelKind {
        ModelKind("xdpm".to_string())
    }
}

impl FromStr for ModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<ModelKind> {
        ModelKind::new(s)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ObservedOptions — knobs for building observed vectors and weights.
///
/// Fields
/// ------
/// - `quantiles`: RT quantile points (deciles by default).
/// - `fit_on`: unit granularity.
/// - `weighted`: bootstrap-based weights when `true`, uniform ones otherwise.
/// - `min_trials`: go-trial count below which a combo is flagged sparse.
/// - `n_boot`: bootstrap resamples per unit and combo.
/// - `variance_floor`: lower bound on the bootstrap variance before
///   inversion.
/// - `seed`: base seed of the bootstrap streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedOptions {
    pub quantiles: Quantiles,
    pub fit_on: FitOn,
    pub weighted: bool,
    pub min_trials: usize,
    pub n_boot: usize,
    pub variance_floor: f64,
    pub seed: u64,
}

impl ObservedOptions {
    /// Errors
    /// ------
    /// - `ConfigError::InvalidCount` for `min_trials == 0` or `n_boot < 2`.
    /// - `ConfigError::InvalidVarianceFloor` for a non-finite or
    ///   non-positive floor.
    pub fn new(
        quantiles: Quantiles, fit_on: FitOn, weighted: bool, min_trials: usize, n_boot: usize,
        variance_floor: f64, seed: u64,
    ) -> ConfigResult<ObservedOptions> {
        let options = ObservedOptions { quantiles, fit_on, weighted, min_trials, n_boot, variance_floor, seed };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_trials == 0 {
            return Err(ConfigError::InvalidCount { name: "min_trials", value: self.min_trials });
        }
        if self.n_boot < 2 {
            return Err(ConfigError::InvalidCount { name: "n_boot", value: self.n_boot });
        }
        if !self.variance_floor.is_finite() || self.variance_floor <= 0.0 {
            return Err(ConfigError::InvalidVarianceFloor { value: self.variance_floor });
        }
        Ok(())
    }

    /// Number of statistics per combo: accuracy plus one per quantile.
    pub fn ncols(&self) -> usize {
        1 + self.quantiles.len()
    }
}

impl Default for ObservedOptions {
    fn default() -> ObservedOptions {
        ObservedOptions {
            quantiles: Quantiles::deciles(),
            fit_on: FitOn::Average,
            weighted: true,
            min_trials: DEFAULT_MIN_TRIALS,
            n_boot: DEFAULT_N_BOOT,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
            seed: 0,
        }
    }
}
