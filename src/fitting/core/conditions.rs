//! Condition factors, their levels, and the level-combo layout of a fit.
//!
//! Purpose
//! -------
//! Derive the experimental conditions of a fit from raw trials and the
//! user's dependency specification ([`DependsOn`]). The resulting
//! [`ConditionSet`] fixes the level ordering that every downstream artifact
//! (parameter names, observed vectors, SSD matrices) is aligned to.
//!
//! Key behaviors
//! -------------
//! - Referenced factors are the sorted, de-duplicated union of all dependency
//!   values; list-valued dependencies are flattened.
//! - Referencing the sentinel factor `"flat"` marks the configuration flat;
//!   a single `"flat"` level is injected.
//! - Levels are string-coerced and sorted with [`compare_levels`]; this order
//!   is load-bearing for pcmap names and observed-vector slices.
//! - `nlevels` is the product of per-factor cardinalities; combos follow the
//!   cross product in factor order with the last factor varying fastest.
//!
//! Invariants & assumptions
//! ------------------------
//! - `cond_matrix.len() == factors.len()` and `nlevels == Π cond_matrix`.
//! - Every level list is non-empty, unique and sorted.
//!
//! Conventions
//! -----------
//! - A level combo is tagged by joining its levels with `_`.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fitting::{
    core::data::{FLAT, Trial, TrialData},
    errors::{ConfigError, FitResult},
};

/// Separator used to join levels of multi-factor combos.
pub const LEVEL_SEP: &str = "_";

/// Dependency of one base parameter on condition factors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dependency {
    Factor(String),
    Factors(Vec<String>),
}

impl Dependency {
    /// Factor names in declaration order.
    pub fn factors(&self) -> Vec<&str> {
        match self {
            Dependency::Factor(f) => vec![f.as_str()],
            Dependency::Factors(fs) => fs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Dependency {
    fn from(factor: &str) -> Dependency {
        Dependency::Factor(factor.to_string())
    }
}

impl From<String> for Dependency {
    fn from(factor: String) -> Dependency {
        Dependency::Factor(factor)
    }
}

impl From<Vec<&str>> for Dependency {
    fn from(factors: Vec<&str>) -> Dependency {
        Dependency::Factors(factors.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Dependency {
    fn from(factors: Vec<String>) -> Dependency {
        Dependency::Factors(factors)
    }
}

/// `DependsOn` — ordered map from base parameter to its condition factors.
///
/// Insertion order is kept: it drives the model id and the pcmap order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependsOn {
    entries: Vec<(String, Dependency)>,
}

impl DependsOn {
    pub fn new() -> DependsOn {
        DependsOn { entries: Vec::new() }
    }

    /// The condition-free default, `{"all": "flat"}`.
    pub fn flat() -> DependsOn {
        DependsOn::new().with("all", FLAT)
    }

    /// Builder-style insert. Re-inserting a parameter replaces its
    /// dependency in place.
    pub fn with(mut self, param: impl Into<String>, dependency: impl Into<Dependency>) -> DependsOn {
        self.insert(param, dependency);
        self
    }

    pub fn insert(&mut self, param: impl Into<String>, dependency: impl Into<Dependency>) {
        let param = param.into();
        let dependency = dependency.into();
        match self.entries.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = dependency,
            None => self.entries.push((param, dependency)),
        }
    }

    pub fn get(&self, param: &str) -> Option<&Dependency> {
        self.entries.iter().find(|(p, _)| p == param).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dependency)> {
        self.entries.iter().map(|(p, d)| (p.as_str(), d))
    }

    /// Base parameter names in insertion order.
    pub fn params(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted, de-duplicated factor names referenced by any parameter.
    pub fn factors(&self) -> Vec<String> {
        let mut factors: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(_, d)| d.factors())
            .map(str::to_string)
            .collect();
        factors.sort();
        factors.dedup();
        factors
    }

    /// Whether the sentinel `"flat"` factor is referenced.
    pub fn is_flat(&self) -> bool {
        self.entries.iter().any(|(_, d)| d.factors().contains(&FLAT))
    }
}

/// Order two string-coerced levels: numeric-looking levels compare
/// numerically and sort before non-numeric ones, which compare
/// lexicographically.
pub fn compare_levels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Full cross product of `lists`, last list varying fastest.
pub(crate) fn cross_product(lists: &[&[String]]) -> Vec<Vec<String>> {
    let mut combos: Vec<Vec<String>> = vec![Vec::new()];
    for list in lists {
        let mut next = Vec::with_capacity(combos.len() * list.len());
        for prefix in &combos {
            for level in list.iter() {
                let mut combo = prefix.clone();
                combo.push(level.clone());
                next.push(combo);
            }
        }
        combos = next;
    }
    combos
}

/// Copy of `data` prepared for `depends_on`: the `"flat"` factor is injected
/// when the configuration is flat and the data does not carry it yet.
pub fn prepare_data(data: &TrialData, depends_on: &DependsOn) -> TrialData {
    if depends_on.is_flat() && !data.has_factor(FLAT) {
        data.with_flat_factor()
    } else {
        data.clone()
    }
}

/// `ConditionSet` — condition factors, sorted levels and combo layout.
///
/// Fields
/// ------
/// - `factors`: sorted referenced factor names.
/// - `is_flat`: whether the `"flat"` sentinel is referenced.
/// - `clmap`: factor → sorted string levels.
/// - `cond_matrix`: per-factor level cardinality (in `factors` order).
/// - `nlevels`: total number of level combos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet {
    factors: Vec<String>,
    is_flat: bool,
    clmap: BTreeMap<String, Vec<String>>,
    cond_matrix: Vec<usize>,
    nlevels: usize,
}

impl ConditionSet {
    /// Derive the condition set of `depends_on` from `data`.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::EmptyDependsOn` for an empty spec.
    /// - `ConfigError::EmptyDependency` for a parameter listing no factors.
    /// - `ConfigError::UnknownFactor` when no trial carries a factor.
    /// - `DataError::MissingFactorValue` when only some trials carry it.
    pub fn new(data: &TrialData, depends_on: &DependsOn) -> FitResult<ConditionSet> {
        if depends_on.is_empty() {
            return Err(ConfigError::EmptyDependsOn.into());
        }
        if let Some((param, _)) = depends_on.iter().find(|(_, d)| d.factors().is_empty()) {
            return Err(ConfigError::EmptyDependency { param: param.to_string() }.into());
        }

        let is_flat = depends_on.is_flat();
        let injected;
        let data = if is_flat && !data.has_factor(FLAT) {
            injected = data.with_flat_factor();
            &injected
        } else {
            data
        };

        let factors = depends_on.factors();
        let mut clmap = BTreeMap::new();
        let mut cond_matrix = Vec::with_capacity(factors.len());
        for factor in &factors {
            if !data.has_factor(factor) {
                return Err(ConfigError::UnknownFactor { factor: factor.clone() }.into());
            }
            let mut levels = data.distinct_levels(factor)?;
            levels.sort_by(|a, b| compare_levels(a, b));
            cond_matrix.push(levels.len());
            clmap.insert(factor.clone(), levels);
        }
        let nlevels = cond_matrix.iter().product();

        Ok(ConditionSet { factors, is_flat, clmap, cond_matrix, nlevels })
    }

    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    pub fn nconds(&self) -> usize {
        self.factors.len()
    }

    pub fn is_flat(&self) -> bool {
        self.is_flat
    }

    pub fn clmap(&self) -> &BTreeMap<String, Vec<String>> {
        &self.clmap
    }

    /// Sorted levels of `factor`.
    pub fn levels(&self, factor: &str) -> Option<&[String]> {
        self.clmap.get(factor).map(Vec::as_slice)
    }

    pub fn cond_matrix(&self) -> &[usize] {
        &self.cond_matrix
    }

    pub fn nlevels(&self) -> usize {
        self.nlevels
    }

    /// All level combos, last factor varying fastest.
    pub fn level_combos(&self) -> Vec<Vec<String>> {
        let lists: Vec<&[String]> = self.factors.iter().map(|f| self.clmap[f].as_slice()).collect();
        cross_product(&lists)
    }

    /// Combo tags (`levels.join("_")`) in combo order.
    pub fn level_tags(&self) -> Vec<String> {
        self.level_combos().iter().map(|c| c.join(LEVEL_SEP)).collect()
    }

    /// Index of the combo a trial belongs to, or `None` if one of its levels
    /// is unknown. The `"flat"` factor matches every trial.
    pub fn combo_index(&self, trial: &Trial) -> Option<usize> {
        let mut index = 0;
        for (factor, &card) in self.factors.iter().zip(&self.cond_matrix) {
            let level = match trial.level(factor) {
                Some(level) => level,
                None if factor == FLAT => FLAT,
                None => return None,
            };
            let pos = self.clmap[factor].iter().position(|l| l == level)?;
            index = index * card + pos;
        }
        Some(index)
    }
}
