use argmin::core::{ArgminError, Error};

use crate::fitting::errors::{ConfigError, FitError};

/// Result alias for cost evaluation.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    /// Simulated vector length differs from the observed vector.
    PredictionLength { expected: usize, actual: usize },

    /// Observed and weight vectors of the fit record differ in length.
    WeightLength { y: usize, wts: usize },

    // ---- Fit configuration ----
    /// Configuration or data failure while assembling or simulating.
    Fit(FitError),

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::NonFiniteCost { value } => write!(f, "Non-finite cost value: {value}"),
            OptError::PredictionLength { expected, actual } => {
                write!(f, "Prediction length mismatch: expected {expected}, actual {actual}")
            }
            OptError::WeightLength { y, wts } => {
                write!(f, "Observed and weight vectors differ: y={y}, wts={wts}")
            }
            OptError::Fit(err) => write!(f, "{err}"),
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<FitError> for OptError {
    fn from(err: FitError) -> OptError {
        OptError::Fit(err)
    }
}

impl From<ConfigError> for OptError {
    fn from(err: ConfigError) -> OptError {
        OptError::Fit(err.into())
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> OptError {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

/// Convert an [`OptError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<OptError> for pyo3::PyErr {
    fn from(err: OptError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
