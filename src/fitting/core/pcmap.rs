//! Parameter → per-condition-level name expansion (`pcmap`).
//!
//! The optimizer addresses conditional parameter values by synthesized names
//! such as `v_easy` / `v_hard`; the simulator needs them back as one value
//! per level combo. [`ParamConditionMap`] owns that expansion:
//!
//! ```text
//! depends_on = {v: cond}            pcmap = {v: [v_easy, v_hard]}
//! optimizer values {v_easy: V1, v_hard: V2}  →  broadcast  →  v = [V1, V2]
//! ```
//!
//! - Single-factor dependency: names follow the factor's sorted levels.
//! - Multi-factor dependency: names follow the full cross product of the
//!   listed factors **in list order**, levels joined with `_`. The order is
//!   positional and must not be re-sorted.
//! - A parameter may depend on a subset of the fit's factors; its list is
//!   then shorter than `nlevels`, and [`ParamConditionMap::level_index`]
//!   maps every global combo onto the parameter's own level.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::fitting::{
    core::conditions::{ConditionSet, DependsOn, LEVEL_SEP, cross_product},
    errors::{ConfigError, ConfigResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PcEntry {
    param: String,
    factors: Vec<String>,
    names: Vec<String>,
}

/// `ParamConditionMap` — ordered base parameter → per-level names.
///
/// Invariants
/// ----------
/// - Names are globally unique.
/// - `names(p).len()` equals the product of the cardinalities of the
///   factors `p` depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamConditionMap {
    entries: Vec<PcEntry>,
}

impl ParamConditionMap {
    /// Expand `depends_on` against the levels in `conditions`.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::UnknownFactor` if a factor is missing from
    ///   `conditions` (the condition set was built from another spec).
    /// - `ConfigError::DuplicateParamName` if two synthesized names collide.
    pub fn new(depends_on: &DependsOn, conditions: &ConditionSet) -> ConfigResult<ParamConditionMap> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut entries = Vec::with_capacity(depends_on.len());

        for (param, dependency) in depends_on.iter() {
            let factors: Vec<String> = dependency.factors().into_iter().map(str::to_string).collect();
            let mut lists: Vec<&[String]> = Vec::with_capacity(factors.len());
            for factor in &factors {
                let levels = conditions
                    .levels(factor)
                    .ok_or_else(|| ConfigError::UnknownFactor { factor: factor.clone() })?;
                lists.push(levels);
            }

            let tags: Vec<String> =
                cross_product(&lists).into_iter().map(|combo| combo.join(LEVEL_SEP)).collect();

            let mut names = Vec::with_capacity(tags.len());
            for tag in tags {
                let name = format!("{param}_{tag}");
                if !seen.insert(name.clone()) {
                    return Err(ConfigError::DuplicateParamName { name });
                }
                names.push(name);
            }
            entries.push(PcEntry { param: param.to_string(), factors, names });
        }

        Ok(ParamConditionMap { entries })
    }

    /// Per-level names of `param`.
    pub fn get(&self, param: &str) -> Option<&[String]> {
        self.entry(param).map(|e| e.names.as_slice())
    }

    /// Factors `param` depends on, in declaration order.
    pub fn factors(&self, param: &str) -> Option<&[String]> {
        self.entry(param).map(|e| e.factors.as_slice())
    }

    pub fn contains(&self, param: &str) -> bool {
        self.entry(param).is_some()
    }

    pub fn params(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.param.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|e| (e.param.as_str(), e.names.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain `param → names` map, e.g. for display or export.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.entries.iter().map(|e| (e.param.clone(), e.names.clone())).collect()
    }

    /// For every global combo of `conditions`, the index into `param`'s own
    /// name list.
    pub fn level_index(&self, param: &str, conditions: &ConditionSet) -> ConfigResult<Vec<usize>> {
        let entry =
            self.entry(param).ok_or_else(|| ConfigError::UnknownParameter { param: param.to_string() })?;

        let mut positions: Vec<(usize, usize, &[String])> = Vec::with_capacity(entry.factors.len());
        for factor in &entry.factors {
            let global = conditions
                .factors()
                .iter()
                .position(|f| f == factor)
                .ok_or_else(|| ConfigError::UnknownFactor { factor: factor.clone() })?;
            let levels = conditions
                .levels(factor)
                .ok_or_else(|| ConfigError::UnknownFactor { factor: factor.clone() })?;
            positions.push((global, levels.len(), levels));
        }

        let index = conditions
            .level_combos()
            .iter()
            .map(|combo| {
                positions.iter().fold(0, |acc, (global, card, levels)| {
                    let pos = levels.iter().position(|l| *l == combo[*global]).unwrap_or(0);
                    acc * card + pos
                })
            })
            .collect();
        Ok(index)
    }

    /// Spread the per-level values of `param` across all `nlevels` combos.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::UnknownParameter` if `param` is not conditional.
    /// - `ConfigError::MissingValue` if a per-level name has no value.
    pub fn broadcast(
        &self, param: &str, values: &BTreeMap<String, f64>, conditions: &ConditionSet,
    ) -> ConfigResult<Vec<f64>> {
        let per_level = self.collect(param, values)?;
        let index = self.level_index(param, conditions)?;
        Ok(index.into_iter().map(|i| per_level[i]).collect())
    }

    /// Values of `param`'s per-level names, in name order.
    pub fn collect(&self, param: &str, values: &BTreeMap<String, f64>) -> ConfigResult<Vec<f64>> {
        let names =
            self.get(param).ok_or_else(|| ConfigError::UnknownParameter { param: param.to_string() })?;
        names
            .iter()
            .map(|name| {
                values.get(name).copied().ok_or_else(|| ConfigError::MissingValue { name: name.clone() })
            })
            .collect()
    }

    fn entry(&self, param: &str) -> Option<&PcEntry> {
        self.entries.iter().find(|e| e.param == param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::core::data::{Trial, TrialData};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Name synthesis for single- and multi-factor dependencies.
    // - Positional ordering in factor-list order.
    // - Broadcasting a parameter that depends on a subset of factors.
    // -------------------------------------------------------------------------

    fn data() -> TrialData {
        let mut trials = Vec::new();
        for cond in ["easy", "hard"] {
            for cue in ["left", "mid", "right"] {
                trials.push(Trial::go("s1", true, Some(0.5)).with_factor("cond", cond).with_factor("cue", cue));
            }
        }
        TrialData::new(trials, 0.65).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify single-factor expansion.
    //
    // Given
    // -----
    // - `depends_on = {v: cond}` with levels easy/hard.
    //
    // Expect
    // ------
    // - `pcmap[v] == [v_easy, v_hard]`.
    fn single_factor_names_follow_sorted_levels() {
        let depends_on = DependsOn::new().with("v", "cond");
        let cset = ConditionSet::new(&data(), &depends_on).unwrap();

        let pcmap = ParamConditionMap::new(&depends_on, &cset).unwrap();

        assert_eq!(pcmap.get("v").unwrap(), &["v_easy".to_string(), "v_hard".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // Verify multi-factor names follow the declared factor order, not the
    // alphabetical one.
    //
    // Given
    // -----
    // - `depends_on = {a: [cue, cond]}` (cue declared first).
    //
    // Expect
    // ------
    // - Six names, cue-major: `a_left_easy, a_left_hard, a_mid_easy, ...`.
    fn multi_factor_names_follow_declared_order() {
        let depends_on = DependsOn::new().with("a", vec!["cue", "cond"]);
        let cset = ConditionSet::new(&data(), &depends_on).unwrap();

        let pcmap = ParamConditionMap::new(&depends_on, &cset).unwrap();
        let names = pcmap.get("a").unwrap();

        assert_eq!(names.len(), 6);
        assert_eq!(&names[..3], &["a_left_easy", "a_left_hard", "a_mid_easy"]);
        assert_eq!(names[5], "a_right_hard");
    }

    #[test]
    // Purpose
    // -------
    // Verify broadcasting of a subset-dependent parameter across all combos.
    //
    // Given
    // -----
    // - `depends_on = {v: cond, tr: cue}` so `nlevels == 6` (cond × cue).
    // - Values v_easy = 1.0, v_hard = 2.0.
    //
    // Expect
    // ------
    // - `broadcast(v)` repeats each cond value across the three cues:
    //   `[1, 1, 1, 2, 2, 2]`.
    fn broadcast_spreads_subset_parameters() {
        let depends_on = DependsOn::new().with("v", "cond").with("tr", "cue");
        let cset = ConditionSet::new(&data(), &depends_on).unwrap();
        let pcmap = ParamConditionMap::new(&depends_on, &cset).unwrap();

        let values: BTreeMap<String, f64> =
            [("v_easy".to_string(), 1.0), ("v_hard".to_string(), 2.0)].into_iter().collect();

        assert_eq!(cset.nlevels(), 6);
        assert_eq!(pcmap.get("v").unwrap().len(), 2);
        assert_eq!(pcmap.broadcast("v", &values, &cset).unwrap(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(pcmap.level_index("tr", &cset).unwrap(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure missing per-level values are reported by name.
    //
    // Given
    // -----
    // - `pcmap = {v: [v_easy, v_hard]}` and a value map lacking `v_hard`.
    //
    // Expect
    // ------
    // - `ConfigError::MissingValue { name: "v_hard" }`.
    fn collect_reports_missing_values() {
        let depends_on = DependsOn::new().with("v", "cond");
        let cset = ConditionSet::new(&data(), &depends_on).unwrap();
        let pcmap = ParamConditionMap::new(&depends_on, &cset).unwrap();
        let values: BTreeMap<String, f64> = [("v_easy".to_string(), 1.0)].into_iter().collect();

        assert_eq!(
            pcmap.collect("v", &values).unwrap_err(),
            ConfigError::MissingValue { name: "v_hard".to_string() }
        );
    }
}
