//! core — trial data, condition layout, observed vectors and SSD info.
//!
//! Purpose
//! -------
//! Collect the data-side building blocks of a fit configuration: validated
//! trial containers, the condition set and parameter-condition map derived
//! from a dependency spec, the observed summary vectors with their cost
//! weights, and the stop-signal-delay layout handed to the simulator.
//!
//! Key behaviors
//! -------------
//! - Validate raw trials once ([`TrialData`]) so downstream code can assume
//!   clean rows.
//! - Derive factors, sorted levels and the combo layout ([`ConditionSet`])
//!   and expand parameters into per-level names ([`ParamConditionMap`]).
//! - Aggregate trials into flat and conditional observed vectors with
//!   bootstrap-based weights ([`ObservedData`]), flagging sparse cells.
//! - Resolve per-combo SSDs and the stop-trial budget split ([`SsdTable`],
//!   [`SsdInfo`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Every artifact built from one [`ConditionSet`] follows its combo order
//!   (cross product over sorted factor names, last factor fastest).
//! - Observed vectors and weights have identical lengths per unit.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based throughout; units are subjects in first-appearance
//!   order, or the single pooled unit `"avg"`.
//! - Sparse cells are reported through [`SparsityFlag`] and `tracing`
//!   warnings, never as errors.

pub mod conditions;
pub mod data;
pub mod observed;
pub mod options;
pub mod pcmap;
pub mod quantiles;
pub mod ssd;
pub mod weights;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::conditions::{ConditionSet, Dependency, DependsOn, compare_levels, prepare_data};
pub use self::data::{FLAT, Trial, TrialData, TrialType};
pub use self::observed::{ObservedData, SparsityFill, SparsityFlag};
pub use self::options::{AVG_UNIT, FitOn, Force, ModelKind, ObservedOptions};
pub use self::pcmap::ParamConditionMap;
pub use self::quantiles::{Quantiles, mquantiles};
pub use self::ssd::{SsdInfo, SsdTable};

pub mod prelude {
    pub use super::conditions::{ConditionSet, DependsOn};
    pub use super::data::{Trial, TrialData, TrialType};
    pub use super::observed::{ObservedData, SparsityFlag};
    pub use super::options::{FitOn, Force, ModelKind, ObservedOptions};
    pub use super::pcmap::ParamConditionMap;
    pub use super::quantiles::Quantiles;
    pub use super::ssd::SsdInfo;
}
