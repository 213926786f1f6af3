//! params — fit and basin parameter records, their store, and θ helpers.
//!
//! Purpose
//! -------
//! Define the typed records a fit model publishes to its collaborators
//! ([`FitParams`], [`BasinParams`]), the typed partial updates accepted by
//! the model setters ([`FitOverrides`], [`BasinOverrides`]), the versioned
//! [`ParamStore`] that publishes them, and the θ helpers that turn initial
//! values and the parameter-condition map into an optimizer parameter set.
//!
//! Invariants & assumptions
//! ------------------------
//! - Published records are immutable; a change always publishes a new
//!   record and bumps the store version.
//! - A record is validated before it is published.

pub mod basinparams;
pub mod fitparams;
pub mod store;
pub mod theta;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::basinparams::{BasinOverrides, BasinParams};
pub use self::fitparams::{FitOverrides, FitParams};
pub use self::store::{ParamStore, StoreState};
pub use self::theta::{
    Inits, ParamSpec, ParameterSet, basinhopping_bounds, bounds, check_inits, default_inits,
    extract_popt, load_parameters, stepsize_scalars,
};
