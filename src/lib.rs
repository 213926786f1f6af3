//! rust_radd — fit-configuration core for stop-signal race/diffusion models.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the fit configuration to Python via the `_rust_radd` extension
//! module. When the `python-bindings` feature is enabled, this module defines
//! the Python-facing `FitModel` class and the parameter-record helpers.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`fitting`, `optimization`,
//!   `persistence`) as the public crate surface.
//! - Define the `#[pyclass]` wrapper and the `#[pymodule]` initializer for
//!   the `_rust_radd` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All configuration logic lives in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Errors from core Rust code are converted to `PyValueError` at the PyO3
//!   boundary.
//!
//! Conventions
//! -----------
//! - Vectors cross the boundary as numpy arrays; records that have no
//!   natural array form (fit/basin parameters) cross as JSON strings.
//! - The library installs no `tracing` subscriber; hosts choose one.

pub mod fitting;
pub mod optimization;
pub mod persistence;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyValueError,
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    fitting::{
        core::options::{FitOn, Force, ModelKind, ObservedOptions},
        models::model::{Component, FitModel, ModelOptions},
        params::{basinparams::BasinOverrides, fitparams::FitOverrides, fitparams::FitParams},
    },
    utils::{build_trials, extract_depends_on, extract_quantiles},
};

/// FitModel — Python-facing wrapper for the fit configuration owner.
///
/// Purpose
/// -------
/// Expose [`crate::fitting::models::FitModel`] to Python callers: build it
/// from trial columns, merge overrides, and read the active fit vectors.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `FitModel(subjects, responses, rts, ssds, tb, factors=None, kind="xdpm",
/// depends_on=None, fit_on="average", quantiles=None, weighted=True,
/// min_trials=10, n_boot=500, seed=0)`:
/// - `rts`, `ssds`: float arrays with NaN for "absent"; a finite SSD marks a
///   stop trial.
/// - `factors`: `{factor: [level per trial]}`.
/// - `depends_on`: `{param: factor | [factor, ...]}`; flat when `None`.
///
/// Notes
/// -----
/// - Setters return the names of the rebuilt components.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FitModel", module = "rust_radd")]
pub struct PyFitModel {
    inner: FitModel,
}

#[cfg(feature = "python-bindings")]
impl PyFitModel {
    fn fitparams(&self) -> PyResult<&FitParams> {
        self.inner.fitparams().ok_or_else(|| PyValueError::new_err("fit parameters not initialized"))
    }
}

#[cfg(feature = "python-bindings")]
fn component_names(components: Vec<Component>) -> Vec<&'static str> {
    components.iter().map(Component::as_str).collect()
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFitModel {
    #[new]
    #[pyo3(signature = (
        subjects, responses, rts, ssds, tb, factors = None, kind = "xdpm", depends_on = None,
        fit_on = "average", quantiles = None, weighted = true, min_trials = 10, n_boot = 500,
        seed = 0
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        py: Python<'py>, subjects: Vec<String>, responses: Vec<bool>, rts: &Bound<'py, PyAny>,
        ssds: &Bound<'py, PyAny>, tb: f64, factors: Option<BTreeMap<String, Vec<String>>>,
        kind: &str, depends_on: Option<&Bound<'py, PyDict>>, fit_on: &str,
        quantiles: Option<Vec<f64>>, weighted: bool, min_trials: usize, n_boot: usize, seed: u64,
    ) -> PyResult<PyFitModel> {
        let data = build_trials(py, subjects, responses, rts, ssds, factors.unwrap_or_default(), tb)?;
        let observed = ObservedOptions {
            quantiles: extract_quantiles(quantiles)?.unwrap_or_default(),
            fit_on: fit_on.parse::<FitOn>()?,
            weighted,
            min_trials,
            n_boot,
            seed,
            ..ObservedOptions::default()
        };
        let options = ModelOptions {
            kind: ModelKind::new(kind)?,
            depends_on: extract_depends_on(depends_on)?,
            observed,
            ..ModelOptions::default()
        };
        Ok(PyFitModel { inner: FitModel::new(data, options)? })
    }

    #[pyo3(signature = (
        force = None, ix = None, ntrials = None, tol = None, maxfev = None, maxiter = None,
        quantiles = None, depends_on = None
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn set_fitparams(
        &mut self, force: Option<&str>, ix: Option<usize>, ntrials: Option<usize>, tol: Option<f64>,
        maxfev: Option<usize>, maxiter: Option<usize>, quantiles: Option<Vec<f64>>,
        depends_on: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Vec<&'static str>> {
        let force = force.map(str::parse::<Force>).transpose()?;
        let overrides = FitOverrides {
            ix,
            ntrials,
            tol,
            maxfev,
            maxiter,
            quantiles: extract_quantiles(quantiles)?,
            depends_on: depends_on.map(|d| extract_depends_on(Some(d))).transpose()?,
            ..FitOverrides::default()
        };
        Ok(component_names(self.inner.set_fitparams(force, overrides)?))
    }

    #[pyo3(signature = (ninits = None, nsamples = None, niter = None, nsuccess = None, tol = None))]
    pub fn set_basinparams(
        &mut self, ninits: Option<usize>, nsamples: Option<usize>, niter: Option<usize>,
        nsuccess: Option<usize>, tol: Option<f64>,
    ) -> PyResult<Vec<&'static str>> {
        let overrides =
            BasinOverrides { ninits, nsamples, niter, nsuccess, tol, ..BasinOverrides::default() };
        Ok(component_names(self.inner.set_basinparams(overrides)?))
    }

    pub fn set_testing_params(&mut self) -> PyResult<Vec<&'static str>> {
        Ok(component_names(self.inner.set_testing_params()?))
    }

    pub fn update_data(&mut self, nlevels: usize) -> PyResult<Vec<&'static str>> {
        Ok(component_names(self.inner.update_data(nlevels)?))
    }

    #[pyo3(signature = (append = None))]
    pub fn generate_model_id(&mut self, append: Option<&str>) -> String {
        self.inner.generate_model_id(append).to_string()
    }

    #[getter]
    pub fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    #[getter]
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }

    #[getter]
    pub fn nlevels(&self) -> PyResult<usize> {
        Ok(self.fitparams()?.nlevels)
    }

    #[getter]
    pub fn idx(&self) -> PyResult<String> {
        Ok(self.fitparams()?.idx.clone())
    }

    #[getter]
    pub fn y<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.fitparams()?.y.clone().into_pyarray(py))
    }

    #[getter]
    pub fn wts<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.fitparams()?.wts.clone().into_pyarray(py))
    }

    #[getter]
    pub fn pcmap(&self) -> BTreeMap<String, Vec<String>> {
        self.inner.pcmap().to_map()
    }

    #[getter]
    pub fn clmap(&self) -> BTreeMap<String, Vec<String>> {
        self.inner.conditions().clmap().clone()
    }

    #[getter]
    pub fn inits(&self) -> BTreeMap<String, f64> {
        self.inner.inits().clone()
    }

    /// Sparse cells as `(unit, combo, ngo, fill)` tuples.
    #[getter]
    pub fn sparsity(&self) -> Vec<(String, String, usize, String)> {
        self.inner
            .sparsity()
            .iter()
            .map(|f| (f.unit.clone(), f.combo.clone(), f.ngo, format!("{:?}", f.fill)))
            .collect()
    }

    pub fn fitparams_json(&self) -> PyResult<String> {
        serde_json::to_string(self.fitparams()?).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn basinparams_json(&self) -> PyResult<String> {
        let basin = self
            .inner
            .basinparams()
            .ok_or_else(|| PyValueError::new_err("basin parameters not initialized"))?;
        serde_json::to_string(basin).map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

/// Write `values` as a `name,value` parameter record at `path`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
fn save_params(path: &str, values: BTreeMap<String, f64>) -> PyResult<()> {
    Ok(persistence::save_params(path, &values)?)
}

/// Read a `name,value` parameter record from `path`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
fn load_params(path: &str) -> PyResult<BTreeMap<String, f64>> {
    Ok(persistence::load_params(path)?)
}

/// _rust_radd — PyO3 module initializer for the Python extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_radd<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<PyFitModel>()?;
    m.add_function(wrap_pyfunction!(save_params, m)?)?;
    m.add_function(wrap_pyfunction!(load_params, m)?)?;
    Ok(())
}
