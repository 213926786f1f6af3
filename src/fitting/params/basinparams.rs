//! Basin parameters — controls of the global (basin-hopping) search stage.
use serde::{Deserialize, Serialize};

use crate::fitting::errors::{ConfigError, ConfigResult};

/// `BasinParams` — global-search controls.
///
/// Fields
/// ------
/// - `ninits`: starting points kept for global search.
/// - `nsamples`: random parameter sets screened to pick `ninits`.
/// - `interval`: step-size adjustment interval.
/// - `t`: acceptance temperature.
/// - `stepsize`: base step size (scaled per coordinate).
/// - `niter`, `maxiter`: basin-hopping iterations and local iteration cap.
/// - `nsuccess`: stop after this many iterations without a new minimum.
/// - `polish_tol`, `tol`: polishing and local tolerances.
/// - `local_method`, `method`: local minimizer and global strategy names.
/// - `init_sample_method`: how screened samples become starting points.
/// - `popsize`, `recombination`: differential-evolution controls.
/// - `progress`, `disp`: reporting switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasinParams {
    pub ninits: usize,
    pub nsamples: usize,
    pub interval: usize,
    #[serde(rename = "T")]
    pub t: f64,
    pub stepsize: f64,
    pub niter: usize,
    pub maxiter: usize,
    pub nsuccess: usize,
    pub polish_tol: f64,
    pub tol: f64,
    pub local_method: String,
    pub method: String,
    pub init_sample_method: String,
    pub popsize: usize,
    pub recombination: f64,
    pub progress: bool,
    pub disp: bool,
}

impl Default for BasinParams {
    fn default() -> BasinParams {
        BasinParams {
            ninits: 3,
            nsamples: 1200,
            interval: 10,
            t: 0.05,
            stepsize: 0.035,
            niter: 400,
            maxiter: 400,
            nsuccess: 100,
            polish_tol: 1e-20,
            tol: 0.01,
            local_method: "L-BFGS-B".to_string(),
            method: "basin".to_string(),
            init_sample_method: "best".to_string(),
            popsize: 15,
            recombination: 0.7,
            progress: true,
            disp: false,
        }
    }
}

impl BasinParams {
    /// Errors
    /// ------
    /// - `ConfigError::InvalidCount` for a zero count knob.
    /// - `ConfigError::InvalidPositive` for a non-finite or non-positive
    ///   real knob.
    pub fn validate(&self) -> ConfigResult<()> {
        let counts = [
            ("ninits", self.ninits),
            ("nsamples", self.nsamples),
            ("interval", self.interval),
            ("niter", self.niter),
            ("maxiter", self.maxiter),
            ("nsuccess", self.nsuccess),
            ("popsize", self.popsize),
        ];
        if let Some((name, value)) = counts.into_iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::InvalidCount { name, value });
        }
        let reals = [
            ("T", self.t),
            ("stepsize", self.stepsize),
            ("polish_tol", self.polish_tol),
            ("tol", self.tol),
            ("recombination", self.recombination),
        ];
        if let Some((name, value)) = reals.into_iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::InvalidPositive { name, value });
        }
        Ok(())
    }
}

/// `BasinOverrides` — typed partial update of [`BasinParams`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasinOverrides {
    pub ninits: Option<usize>,
    pub nsamples: Option<usize>,
    pub interval: Option<usize>,
    pub t: Option<f64>,
    pub stepsize: Option<f64>,
    pub niter: Option<usize>,
    pub maxiter: Option<usize>,
    pub nsuccess: Option<usize>,
    pub polish_tol: Option<f64>,
    pub tol: Option<f64>,
    pub local_method: Option<String>,
    pub method: Option<String>,
    pub init_sample_method: Option<String>,
    pub popsize: Option<usize>,
    pub recombination: Option<f64>,
    pub progress: Option<bool>,
    pub disp: Option<bool>,
}

impl BasinOverrides {
    /// Copy of `base` with every set override applied.
    pub fn apply(&self, base: &BasinParams) -> BasinParams {
        BasinParams {
            ninits: self.ninits.unwrap_or(base.ninits),
            nsamples: self.nsamples.unwrap_or(base.nsamples),
            interval: self.interval.unwrap_or(base.interval),
            t: self.t.unwrap_or(base.t),
            stepsize: self.stepsize.unwrap_or(base.stepsize),
            niter: self.niter.unwrap_or(base.niter),
            maxiter: self.maxiter.unwrap_or(base.maxiter),
            nsuccess: self.nsuccess.unwrap_or(base.nsuccess),
            polish_tol: self.polish_tol.unwrap_or(base.polish_tol),
            tol: self.tol.unwrap_or(base.tol),
            local_method: self.local_method.clone().unwrap_or_else(|| base.local_method.clone()),
            method: self.method.clone().unwrap_or_else(|| base.method.clone()),
            init_sample_method: self
                .init_sample_method
                .clone()
                .unwrap_or_else(|| base.init_sample_method.clone()),
            popsize: self.popsize.unwrap_or(base.popsize),
            recombination: self.recombination.unwrap_or(base.recombination),
            progress: self.progress.unwrap_or(base.progress),
            disp: self.disp.unwrap_or(base.disp),
        }
    }
}
