//! Conversion helpers between Python inputs and the fitting types.
#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::fitting::core::{
    conditions::DependsOn,
    data::{Trial, TrialData},
    quantiles::Quantiles,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build validated trials from column data.
///
/// `rts` and `ssds` use NaN for "absent"; a trial is a stop trial iff its
/// SSD is finite. Every factor column must have one level per trial.
#[cfg(feature = "python-bindings")]
pub fn build_trials<'py>(
    py: Python<'py>, subjects: Vec<String>, responses: Vec<bool>, rts: &Bound<'py, PyAny>,
    ssds: &Bound<'py, PyAny>, factors: BTreeMap<String, Vec<String>>, tb: f64,
) -> PyResult<TrialData> {
    let n = subjects.len();
    let rts = extract_f64_array(py, rts)?;
    let ssds = extract_f64_array(py, ssds)?;
    let rts = rts.as_slice()?;
    let ssds = ssds.as_slice()?;
    if responses.len() != n || rts.len() != n || ssds.len() != n {
        return Err(PyValueError::new_err(
            "subjects, responses, rts and ssds must have the same length",
        ));
    }
    if let Some((name, _)) = factors.iter().find(|(_, levels)| levels.len() != n) {
        return Err(PyValueError::new_err(format!(
            "factor column '{name}' must have one level per trial"
        )));
    }

    let mut trials = Vec::with_capacity(n);
    for (i, subject) in subjects.into_iter().enumerate() {
        let rt = rts[i].is_finite().then_some(rts[i]);
        let mut trial = if ssds[i].is_finite() {
            Trial::stop(subject, ssds[i], responses[i], rt)
        } else {
            Trial::go(subject, responses[i], rt)
        };
        for (name, levels) in &factors {
            trial = trial.with_factor(name.as_str(), &levels[i]);
        }
        trials.push(trial);
    }
    Ok(TrialData::new(trials, tb)?)
}

/// `{param: factor | [factor, ...]}` → [`DependsOn`]; `None` → flat.
#[cfg(feature = "python-bindings")]
pub fn extract_depends_on(raw: Option<&Bound<'_, PyDict>>) -> PyResult<DependsOn> {
    let Some(raw) = raw else {
        return Ok(DependsOn::flat());
    };
    let mut depends_on = DependsOn::new();
    for (key, value) in raw.iter() {
        let param: String = key.extract()?;
        if let Ok(factor) = value.extract::<String>() {
            depends_on.insert(param, factor);
        } else {
            let factors: Vec<String> = value.extract().map_err(|_| {
                PyTypeError::new_err("depends_on values must be a str or a list of str")
            })?;
            depends_on.insert(param, factors);
        }
    }
    Ok(depends_on)
}

#[cfg(feature = "python-bindings")]
pub fn extract_quantiles(raw: Option<Vec<f64>>) -> PyResult<Option<Quantiles>> {
    Ok(raw.map(Quantiles::new).transpose()?)
}
