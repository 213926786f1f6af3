//! fitting — fit configuration for stop-signal race and diffusion models.
//!
//! Purpose
//! -------
//! Turn trial-level stop-signal data into everything a model fit needs:
//! condition layouts, per-parameter condition names, observed accuracy and
//! RT-quantile vectors with inverse-variance weights, stop-signal-delay
//! layouts, and the versioned fit/basin parameter records consumed by
//! simulators and optimizers.
//!
//! Layers
//! ------
//! - [`core`]: trial containers, conditions, pcmap, quantiles, observed
//!   data and weights, SSD layouts.
//! - [`params`]: fit/basin records, typed overrides, the versioned store
//!   and θ helpers.
//! - [`models`]: [`FitModel`] and the snapshot-and-notify seam.
//! - [`errors`]: [`ConfigError`], [`DataError`], [`FitError`] and
//!   [`PersistError`].
//!
//! Conventions
//! -----------
//! - Configuration and data problems are returned as typed errors; sparse
//!   cells are logged through `tracing` and recorded, never raised.
//! - The layer performs no I/O; see `crate::persistence` for records on
//!   disk.

pub mod core;
pub mod errors;
pub mod models;
pub mod params;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    ConditionSet, DependsOn, FitOn, Force, ModelKind, ObservedData, ObservedOptions,
    ParamConditionMap, Quantiles, SparsityFlag, SsdInfo, Trial, TrialData,
};
pub use self::errors::{
    ConfigError, ConfigResult, DataError, DataResult, FitError, FitResult, PersistError,
    PersistResult,
};
pub use self::models::{Component, FitCollaborator, FitModel, FitSnapshot, ModelOptions};
pub use self::params::{BasinOverrides, BasinParams, FitOverrides, FitParams, ParameterSet};

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{ConfigError, DataError, FitError, FitResult};
    pub use super::models::prelude::*;
    pub use super::params::{BasinOverrides, BasinParams, FitOverrides, FitParams};
}
