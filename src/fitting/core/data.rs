//! Trial-level behavioral data for stop-signal fits.
//!
//! Purpose
//! -------
//! Provide small, validated containers for raw trial data: one [`Trial`] per
//! behavioral observation and a [`TrialData`] collection that owns them
//! together with the time boundary estimated upstream. This module
//! centralizes input validation so condition, observed-data and SSD code can
//! assume clean rows.
//!
//! Key behaviors
//! -------------
//! - Condition-factor values are coerced to strings when a trial is built,
//!   even if they were numeric, so identifiers built from them are stable.
//! - [`TrialData::new`] enforces non-emptiness, subject ids, RT validity on
//!   responded trials and SSD validity on stop trials.
//! - [`TrialData::with_flat_factor`] returns a copy with a synthetic
//!   `"flat"` factor whose single level is `"flat"`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data reaching this module has already been outlier-filtered.
//! - A responded trial has a finite RT `> 0`.
//! - Every stop trial has a finite SSD `>= 0`.
//!
//! Conventions
//! -----------
//! - Subjects are listed in order of first appearance.
//! - RT and SSD share whatever time unit the loader used.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fitting::errors::{DataError, DataResult};

/// Name of the synthetic factor injected for condition-free fits.
pub const FLAT: &str = "flat";

/// Trial type of a stop-signal task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialType {
    Go,
    Stop,
}

/// `Trial` — one immutable behavioral observation.
///
/// Fields
/// ------
/// - `subject`: subject identifier.
/// - `conditions`: factor name → string level.
/// - `ttype`: go or stop trial.
/// - `response`: whether a response was made.
/// - `rt`: reaction time of the response, if any.
/// - `ssd`: stop-signal delay (stop trials only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub subject: String,
    pub conditions: BTreeMap<String, String>,
    pub ttype: TrialType,
    pub response: bool,
    pub rt: Option<f64>,
    pub ssd: Option<f64>,
}

impl Trial {
    /// Build a go trial. `rt` is ignored when `response` is false.
    pub fn go(subject: impl Into<String>, response: bool, rt: Option<f64>) -> Trial {
        let rt = if response { rt } else { None };
        Trial {
            subject: subject.into(),
            conditions: BTreeMap::new(),
            ttype: TrialType::Go,
            response,
            rt,
            ssd: None,
        }
    }

    /// Build a stop trial at delay `ssd`. A response on a stop trial is a
    /// failed inhibition; its RT is kept when provided.
    pub fn stop(subject: impl Into<String>, ssd: f64, response: bool, rt: Option<f64>) -> Trial {
        let rt = if response { rt } else { None };
        Trial {
            subject: subject.into(),
            conditions: BTreeMap::new(),
            ttype: TrialType::Stop,
            response,
            rt,
            ssd: Some(ssd),
        }
    }

    /// Attach a condition-factor level, coercing it to a string.
    pub fn with_factor(mut self, factor: impl Into<String>, level: impl ToString) -> Trial {
        self.conditions.insert(factor.into(), level.to_string());
        self
    }

    /// Level of `factor` on this trial, if any.
    pub fn level(&self, factor: &str) -> Option<&str> {
        self.conditions.get(factor).map(String::as_str)
    }

    /// Go trial with a response and a usable RT.
    pub fn is_correct_go(&self) -> bool {
        self.ttype == TrialType::Go && self.response && self.rt.is_some()
    }
}

/// `TrialData` — validated trial collection plus its time boundary.
///
/// Invariants
/// ----------
/// - `trials` is non-empty and every trial passed [`TrialData::new`] checks.
/// - `tb` is finite and `> 0`.
/// - `subjects` lists each subject once, in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialData {
    trials: Vec<Trial>,
    subjects: Vec<String>,
    tb: f64,
}

impl TrialData {
    /// Construct validated trial data.
    ///
    /// Errors
    /// ------
    /// - `DataError::EmptyData` when `trials` is empty.
    /// - `DataError::EmptySubject` for a blank subject id.
    /// - `DataError::InvalidRt` for a responded trial with a missing,
    ///   non-finite or non-positive RT (a missing RT is reported as NaN).
    /// - `DataError::MissingSsd` / `DataError::InvalidSsd` for stop trials.
    /// - `DataError::InvalidTimeBoundary` when `tb` is not finite and `> 0`.
    pub fn new(trials: Vec<Trial>, tb: f64) -> DataResult<TrialData> {
        if trials.is_empty() {
            return Err(DataError::EmptyData);
        }
        if !tb.is_finite() || tb <= 0.0 {
            return Err(DataError::InvalidTimeBoundary { value: tb });
        }

        let mut subjects: Vec<String> = Vec::new();
        for (index, trial) in trials.iter().enumerate() {
            if trial.subject.trim().is_empty() {
                return Err(DataError::EmptySubject { index });
            }
            if trial.response {
                let value = trial.rt.unwrap_or(f64::NAN);
                if !value.is_finite() || value <= 0.0 {
                    return Err(DataError::InvalidRt { index, value });
                }
            }
            if trial.ttype == TrialType::Stop {
                match trial.ssd {
                    None => return Err(DataError::MissingSsd { index }),
                    Some(value) if !value.is_finite() || value < 0.0 => {
                        return Err(DataError::InvalidSsd { index, value });
                    }
                    Some(_) => {}
                }
            }
            if !subjects.contains(&trial.subject) {
                subjects.push(trial.subject.clone());
            }
        }

        Ok(TrialData { trials, subjects, tb })
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn nsubjects(&self) -> usize {
        self.subjects.len()
    }

    /// Time boundary of the response window.
    pub fn tb(&self) -> f64 {
        self.tb
    }

    pub fn has_stop_trials(&self) -> bool {
        self.trials.iter().any(|t| t.ttype == TrialType::Stop)
    }

    /// Whether any trial carries `factor`.
    pub fn has_factor(&self, factor: &str) -> bool {
        self.trials.iter().any(|t| t.conditions.contains_key(factor))
    }

    /// Distinct levels of `factor`, unsorted.
    ///
    /// Errors
    /// ------
    /// - `DataError::MissingFactorValue` for the first trial lacking `factor`.
    pub fn distinct_levels(&self, factor: &str) -> DataResult<Vec<String>> {
        let mut levels: Vec<String> = Vec::new();
        for (index, trial) in self.trials.iter().enumerate() {
            let level = trial.level(factor).ok_or_else(|| DataError::MissingFactorValue {
                index,
                factor: factor.to_string(),
            })?;
            if !levels.iter().any(|l| l == level) {
                levels.push(level.to_string());
            }
        }
        Ok(levels)
    }

    /// Copy of this data where every trial carries the `"flat"` factor.
    pub fn with_flat_factor(&self) -> TrialData {
        let trials = self.trials.iter().cloned().map(|t| t.with_factor(FLAT, FLAT)).collect();
        TrialData { trials, subjects: self.subjects.clone(), tb: self.tb }
    }

    /// Trials belonging to `subject`.
    pub fn subject_trials<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Trial> + 'a {
        self.trials.iter().filter(move |t| t.subject == subject)
    }
}
