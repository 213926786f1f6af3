//! Snapshot-and-notify seam between a fit model and its consumers.
//!
//! A model publishes immutable [`FitSnapshot`]s tagged with a revision
//! number. Consumers (simulator, optimizer drivers) keep the revision they
//! last synced to and are refreshed through `FitModel::notify` when it is
//! stale; they never hold a mutable view of the model's records.
use std::sync::Arc;

use crate::fitting::params::{BasinParams, FitParams};

/// Immutable view of the published parameter records.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSnapshot {
    pub revision: u64,
    pub fitparams: Arc<FitParams>,
    pub basinparams: Arc<BasinParams>,
}

/// Consumer of fit snapshots.
pub trait FitCollaborator {
    /// Revision of the last snapshot applied, `None` if never synced.
    fn synced_revision(&self) -> Option<u64>;

    /// Replace any cached view with `snapshot`.
    fn refresh(&mut self, snapshot: &FitSnapshot);

    /// Whether `revision` is newer than what this consumer holds.
    fn is_stale(&self, revision: u64) -> bool {
        self.synced_revision() != Some(revision)
    }
}
