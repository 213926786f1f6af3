//! optimization — optimizer-facing cost adapter and its error surface.
//!
//! Purpose
//! -------
//! Connect a published fit record to an `argmin` solver. Callers supply a
//! [`Simulator`] producing predicted summary vectors; [`WlsCost`] turns a
//! proposed θ into the weighted sum of squared residuals against the
//! record's observed vector.
//!
//! Conventions
//! -----------
//! - θ holds only the varying entries of a `ParameterSet`, in its order.
//! - Failures inside the cost are reported as [`OptError`]; they travel
//!   through `argmin` as boxed errors and convert back via `From`.

pub mod cost;
pub mod errors;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::cost::{Simulator, Theta, WlsCost, weighted_sse};
pub use self::errors::{OptError, OptResult};
