//! models — the fit configuration owner and its collaborator seam.
//!
//! Purpose
//! -------
//! Expose [`FitModel`], which ties validated trial data to the condition
//! layout, observed vectors, SSD layout and the published fit/basin records,
//! plus the [`FitCollaborator`] trait consumers implement to receive
//! [`FitSnapshot`]s.
//!
//! Key behaviors
//! -------------
//! - Setters take typed overrides, rebuild only what the overrides
//!   invalidate and return the rebuilt [`Component`]s.
//! - Failing setters commit nothing.
//! - Each commit bumps a revision used to refresh stale collaborators.

pub mod collaborator;
pub mod model;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::collaborator::{FitCollaborator, FitSnapshot};
pub use self::model::{Component, FitModel, ModelOptions, model_id};

pub mod prelude {
    pub use super::collaborator::{FitCollaborator, FitSnapshot};
    pub use super::model::{Component, FitModel, ModelOptions};
}
