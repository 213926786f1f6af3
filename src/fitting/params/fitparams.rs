//! Fit parameters — the typed record handed to simulator and optimizer.
//!
//! Purpose
//! -------
//! Hold everything one fit needs: active unit, trial budget, integration
//! step, optimizer tolerances, the condition maps, the active observed and
//! weight vectors, and the stop-signal-delay layout. The record is built
//! and republished by `FitModel`; this module owns its shape, defaults,
//! the typed override set and numeric validation.
//!
//! Conventions
//! -----------
//! - `nlevels == 1` selects flat vectors, `nlevels > 1` conditional ones.
//! - `idx` is `"avg"` for pooled fits and the subject id otherwise.
use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::fitting::{
    core::{
        conditions::DependsOn,
        options::{FitOn, ModelKind},
        pcmap::ParamConditionMap,
        quantiles::Quantiles,
        ssd::SsdInfo,
    },
    errors::{ConfigError, ConfigResult},
    params::theta::Inits,
};

pub const DEFAULT_NTRIALS: usize = 20000;
pub const DEFAULT_SI: f64 = 0.1;
pub const DEFAULT_DT: f64 = 0.002;
pub const DEFAULT_TOL: f64 = 1e-30;
pub const DEFAULT_METHOD: &str = "nelder";
pub const DEFAULT_MAXFEV: usize = 450;
pub const DEFAULT_MAXITER: usize = 450;

/// `FitParams` — fit configuration snapshot.
///
/// Fields
/// ------
/// - `ix`: active unit index.
/// - `ntrials`: simulated trials per combo.
/// - `si`, `dt`: diffusion noise and integration step.
/// - `tol`, `method`, `maxfev`, `maxiter`: local optimizer controls.
/// - `kind`, `depends_on`, `clmap`, `pcmap`: model family and condition maps.
/// - `ssd_method`, `learn`: passthrough simulator switches.
/// - `quantiles`, `fit_on`: observed-vector layout.
/// - `model_id`: output identifier.
/// - `inits`: initial base-parameter values.
/// - `nlevels`: active level count (1 for flat fits).
/// - `nidx`: number of subjects; `idx`: active unit label.
/// - `tb`: time boundary of the response window.
/// - `y`, `wts`: active observed and weight vectors.
/// - `ssd_info`: SSD layout, when the data has stop trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub ix: usize,
    pub ntrials: usize,
    pub si: f64,
    pub dt: f64,
    pub tol: f64,
    pub method: String,
    pub maxfev: usize,
    pub maxiter: usize,
    pub kind: ModelKind,
    pub clmap: BTreeMap<String, Vec<String>>,
    pub pcmap: ParamConditionMap,
    pub depends_on: DependsOn,
    pub ssd_method: Option<String>,
    pub quantiles: Quantiles,
    pub fit_on: FitOn,
    pub model_id: String,
    pub learn: bool,
    pub inits: Inits,
    pub nlevels: usize,
    pub nidx: usize,
    pub idx: String,
    pub tb: f64,
    pub y: Array1<f64>,
    pub wts: Array1<f64>,
    pub ssd_info: Option<SsdInfo>,
}

impl FitParams {
    /// Check the numeric knobs.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::InvalidTrialCount` for `ntrials < 2`.
    /// - `ConfigError::InvalidPositive` for a non-finite or non-positive
    ///   `si`, `dt` or `tol`.
    /// - `ConfigError::InvalidCount` for zero `maxfev` / `maxiter`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ntrials < 2 {
            return Err(ConfigError::InvalidTrialCount { ntrials: self.ntrials });
        }
        for (name, value) in [("si", self.si), ("dt", self.dt), ("tol", self.tol)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidPositive { name, value });
            }
        }
        for (name, value) in [("maxfev", self.maxfev), ("maxiter", self.maxiter)] {
            if value == 0 {
                return Err(ConfigError::InvalidCount { name, value });
            }
        }
        Ok(())
    }

    /// Export as a flat JSON key-value record.
    pub fn to_record(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// `FitOverrides` — typed partial update of [`FitParams`].
///
/// `None` leaves a field unchanged. `quantiles` and `depends_on` trigger
/// rebuilds in the owning model; the rest are merged as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOverrides {
    pub ix: Option<usize>,
    pub ntrials: Option<usize>,
    pub si: Option<f64>,
    pub dt: Option<f64>,
    pub tol: Option<f64>,
    pub method: Option<String>,
    pub maxfev: Option<usize>,
    pub maxiter: Option<usize>,
    pub quantiles: Option<Quantiles>,
    pub depends_on: Option<DependsOn>,
    pub inits: Option<Inits>,
}

impl FitOverrides {
    pub fn new() -> FitOverrides {
        FitOverrides::default()
    }

    pub fn ix(mut self, ix: usize) -> FitOverrides {
        self.ix = Some(ix);
        self
    }

    pub fn ntrials(mut self, ntrials: usize) -> FitOverrides {
        self.ntrials = Some(ntrials);
        self
    }

    pub fn tol(mut self, tol: f64) -> FitOverrides {
        self.tol = Some(tol);
        self
    }

    pub fn maxfev(mut self, maxfev: usize) -> FitOverrides {
        self.maxfev = Some(maxfev);
        self
    }

    pub fn quantiles(mut self, quantiles: Quantiles) -> FitOverrides {
        self.quantiles = Some(quantiles);
        self
    }

    pub fn depends_on(mut self, depends_on: DependsOn) -> FitOverrides {
        self.depends_on = Some(depends_on);
        self
    }

    /// Whether any override is set.
    pub fn is_empty(&self) -> bool {
        *self == FitOverrides::default()
    }

    /// Merge the plain fields into `params`. `quantiles`, `depends_on` and
    /// `inits` are left to the caller, which owns the rebuilds they imply.
    pub fn merge_scalars(&self, params: &mut FitParams) {
        if let Some(ix) = self.ix {
            params.ix = ix;
        }
        if let Some(ntrials) = self.ntrials {
            params.ntrials = ntrials;
        }
        if let Some(si) = self.si {
            params.si = si;
        }
        if let Some(dt) = self.dt {
            params.dt = dt;
        }
        if let Some(tol) = self.tol {
            params.tol = tol;
        }
        if let Some(method) = &self.method {
            params.method = method.clone();
        }
        if let Some(maxfev) = self.maxfev {
            params.maxfev = maxfev;
        }
        if let Some(maxiter) = self.maxiter {
            params.maxiter = maxiter;
        }
    }
}
