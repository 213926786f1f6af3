//! Errors for the fit-configuration layer (configuration checks, raw-data
//! checks, and the persistence format).
//!
//! This module defines two primary error types, [`ConfigError`] and
//! [`DataError`], which are unified by [`FitError`] for call sites that can
//! fail for either reason, plus [`PersistError`] for the delimited
//! parameter/fit record format. All implement `Display`/`Error` and, behind
//! the `python-bindings` feature, convert to `PyErr`.
//!
//! ## Conventions
//! - **Indices are 0-based**.
//! - Configuration errors are raised at configuration time and are never
//!   silently corrected.
//! - Data errors are raised at the point raw trials are first consumed.
//! - Sparse condition cells are **not** errors; they are reported through
//!   [`crate::fitting::core::observed::SparsityFlag`].
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for configuration-validation paths.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for raw-data consumption paths.
pub type DataResult<T> = Result<T, DataError>;

/// Result alias for operations that may fail on configuration or data.
pub type FitResult<T> = Result<T, FitError>;

/// Result alias for the persistence format readers/writers.
pub type PersistResult<T> = Result<T, PersistError>;

/// Invalid or inconsistent user-supplied configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    // ---- Condition dependencies ----
    /// `depends_on` has no entries.
    EmptyDependsOn,

    /// A parameter lists no factors at all.
    EmptyDependency { param: String },

    /// `depends_on` references a factor that no trial carries.
    UnknownFactor { factor: String },

    /// Level names collided while synthesizing per-level parameter names.
    DuplicateParamName { name: String },

    /// A parameter has no entry in the parameter-condition map.
    UnknownParameter { param: String },

    // ---- Fit options ----
    /// Quantile array is empty, unsorted, or outside (0, 1).
    InvalidQuantiles { value: f64, reason: &'static str },

    /// `fit_on` is not one of the supported granularities.
    InvalidFitOn { name: String },

    /// Model kind tag does not name a known model family.
    InvalidKind { kind: String },

    /// `force` is not one of the supported overrides.
    InvalidForce { name: String },

    /// Active fit index out of bounds for the current unit count.
    IndexOutOfRange { ix: usize, len: usize },

    /// Requested level count is neither 1 nor the condition set's count.
    InvalidLevelCount { nlevels: usize, expected: usize },

    /// Trial budget must be at least two (one go and one stop slot).
    InvalidTrialCount { ntrials: usize },

    /// Numeric knob must be finite and strictly positive.
    InvalidPositive { name: &'static str, value: f64 },

    /// Counting knob must be strictly positive.
    InvalidCount { name: &'static str, value: usize },

    /// Weight variance floor must be finite and strictly positive.
    InvalidVarianceFloor { value: f64 },

    // ---- Parameters ----
    /// A conditional parameter has no initial value.
    MissingInit { param: String },

    /// A parameter has no search bounds for this model kind.
    MissingBounds { param: String },

    /// A parameter has no basin-hopping step scale.
    MissingStepScale { param: String },

    /// A per-level value is missing from a name → value map.
    MissingValue { name: String },

    /// Parameter vector length disagrees with the varying parameter names.
    ThetaLengthMismatch { expected: usize, actual: usize },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Condition dependencies ----
            ConfigError::EmptyDependsOn => {
                write!(f, "depends_on must contain at least one parameter.")
            }
            ConfigError::EmptyDependency { param } => {
                write!(f, "Parameter '{param}' depends on an empty list of factors.")
            }
            ConfigError::UnknownFactor { factor } => {
                write!(f, "Condition factor '{factor}' is not present in the data.")
            }
            ConfigError::DuplicateParamName { name } => {
                write!(f, "Per-level parameter name '{name}' is not unique.")
            }
            ConfigError::UnknownParameter { param } => {
                write!(f, "Parameter '{param}' is not conditioned on any factor.")
            }
            // ---- Fit options ----
            ConfigError::InvalidQuantiles { value, reason } => {
                write!(f, "Invalid quantile {value}: {reason}")
            }
            ConfigError::InvalidFitOn { name } => {
                write!(f, "Invalid fit_on '{name}': expected 'average' or 'subjects'.")
            }
            ConfigError::InvalidKind { kind } => {
                write!(
                    f,
                    "Invalid model kind '{kind}': expected a tag containing 'dpm', 'race', 'iact' or 'pro'."
                )
            }
            ConfigError::InvalidForce { name } => {
                write!(f, "Invalid force '{name}': expected 'cond' or 'flat'.")
            }
            ConfigError::IndexOutOfRange { ix, len } => {
                write!(f, "Fit index {ix} is out of range for {len} fit unit(s).")
            }
            ConfigError::InvalidLevelCount { nlevels, expected } => {
                write!(f, "nlevels must be 1 or {expected}; got {nlevels}.")
            }
            ConfigError::InvalidTrialCount { ntrials } => {
                write!(f, "ntrials must be at least 2; got {ntrials}.")
            }
            ConfigError::InvalidPositive { name, value } => {
                write!(f, "{name} must be finite and > 0; got {value}.")
            }
            ConfigError::InvalidCount { name, value } => {
                write!(f, "{name} must be > 0; got {value}.")
            }
            ConfigError::InvalidVarianceFloor { value } => {
                write!(f, "variance_floor must be finite and > 0; got {value}.")
            }
            // ---- Parameters ----
            ConfigError::MissingInit { param } => {
                write!(f, "No initial value provided for parameter '{param}'.")
            }
            ConfigError::MissingBounds { param } => {
                write!(f, "No search bounds defined for parameter '{param}'.")
            }
            ConfigError::MissingStepScale { param } => {
                write!(f, "No basin-hopping step scale defined for parameter '{param}'.")
            }
            ConfigError::MissingValue { name } => {
                write!(f, "No value provided for '{name}'.")
            }
            ConfigError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, got {actual}.")
            }
        }
    }
}

/// Structurally invalid or insufficient raw data.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// No trials were supplied.
    EmptyData,

    /// A trial has an empty subject identifier.
    EmptySubject { index: usize },

    /// A responded trial carries a non-finite or non-positive RT.
    InvalidRt { index: usize, value: f64 },

    /// A stop trial carries a non-finite or negative stop-signal delay.
    InvalidSsd { index: usize, value: f64 },

    /// A stop trial has no stop-signal delay.
    MissingSsd { index: usize },

    /// A trial lacks a value for a referenced condition factor.
    MissingFactorValue { index: usize, factor: String },

    /// Time boundary must be finite and > 0.
    InvalidTimeBoundary { value: f64 },

    /// A fit unit has no usable go trials or correct RTs.
    EmptySubjectGroup { unit: String },

    /// Stop trials are absent where a stop-signal delay grid is required.
    NoStopTrials { unit: String, combo: String },

    /// Distinct SSD counts differ across condition combos or subjects.
    RaggedSsd { expected: usize, actual: usize, combo: String },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptyData => write!(f, "Trial data is empty."),
            DataError::EmptySubject { index } => {
                write!(f, "Trial at index {index} has an empty subject identifier.")
            }
            DataError::InvalidRt { index, value } => {
                write!(f, "Trial at index {index} has an invalid reaction time: {value}")
            }
            DataError::InvalidSsd { index, value } => {
                write!(f, "Trial at index {index} has an invalid stop-signal delay: {value}")
            }
            DataError::MissingSsd { index } => {
                write!(f, "Stop trial at index {index} has no stop-signal delay.")
            }
            DataError::MissingFactorValue { index, factor } => {
                write!(f, "Trial at index {index} has no value for condition factor '{factor}'.")
            }
            DataError::InvalidTimeBoundary { value } => {
                write!(f, "Time boundary must be finite and > 0; got {value}.")
            }
            DataError::EmptySubjectGroup { unit } => {
                write!(f, "Fit unit '{unit}' has no go trials with a correct response.")
            }
            DataError::NoStopTrials { unit, combo } => {
                write!(f, "Fit unit '{unit}' has no stop trials in condition '{combo}'.")
            }
            DataError::RaggedSsd { expected, actual, combo } => {
                write!(
                    f,
                    "Condition '{combo}' has {actual} distinct stop-signal delays; expected {expected}."
                )
            }
        }
    }
}

/// Unified error for operations touching both configuration and data.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    Config(ConfigError),
    Data(DataError),
}

impl std::error::Error for FitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FitError::Config(err) => Some(err),
            FitError::Data(err) => Some(err),
        }
    }
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Config(err) => write!(f, "Configuration error: {err}"),
            FitError::Data(err) => write!(f, "Data error: {err}"),
        }
    }
}

impl From<ConfigError> for FitError {
    fn from(err: ConfigError) -> FitError {
        FitError::Config(err)
    }
}

impl From<DataError> for FitError {
    fn from(err: DataError) -> FitError {
        FitError::Data(err)
    }
}

/// Errors raised while reading or writing parameter/fit records.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistError {
    /// Underlying reader/writer failed.
    Io { text: String },

    /// A record line could not be parsed.
    Malformed { line: usize, reason: &'static str },

    /// Columns of a fit record have different lengths.
    LengthMismatch { y: usize, wts: usize, yhat: usize },
}

impl std::error::Error for PersistError {}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io { text } => write!(f, "I/O failure: {text}"),
            PersistError::Malformed { line, reason } => {
                write!(f, "Malformed record at line {line}: {reason}")
            }
            PersistError::LengthMismatch { y, wts, yhat } => {
                write!(f, "Fit columns differ in length: y={y}, wts={wts}, yhat={yhat}")
            }
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> PersistError {
        PersistError::Io { text: err.to_string() }
    }
}

/// Convert a [`ConfigError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Convert a [`DataError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Convert a [`FitError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<FitError> for PyErr {
    fn from(err: FitError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Convert a [`PersistError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<PersistError> for PyErr {
    fn from(err: PersistError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
