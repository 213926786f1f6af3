//! θ helpers — initial values, bounds and the optimizer parameter set.
//!
//! Purpose
//! -------
//! Turn a model kind, initial values and a parameter-condition map into the
//! bounded parameter set an optimizer searches over, and map optimized
//! values back to per-parameter vectors.
//!
//! Key behaviors
//! -------------
//! - [`default_inits`] / [`check_inits`]: kind-dependent defaults and the
//!   coercions that keep an inits map consistent with the model family.
//! - [`bounds`]: search interval per parameter (the stop drift `ssv` is
//!   negative for all kinds except independent races).
//! - [`load_parameters`]: conditional parameters expand into one varying,
//!   bounded entry per level; the rest vary (flat fits) or stay fixed
//!   (conditional fits).
//! - [`basinhopping_bounds`], [`stepsize_scalars`]: per-coordinate bounds
//!   and step scales for global search, repeated `nlevels` times.
//! - [`extract_popt`]: regroup a flat name → value map into per-parameter
//!   vectors.
//!
//! Conventions
//! -----------
//! - Parameter names: `a` (boundary), `tr` (onset), `v` (go drift), `ssv`
//!   (stop drift), `z` (starting point), `xb` (dynamic gain), `si`
//!   (diffusion noise), `sso` (stop onset).
//! - Maps are `BTreeMap`s, so iteration is in name order.
use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::fitting::{
    core::{conditions::DependsOn, options::ModelKind, pcmap::ParamConditionMap},
    errors::{ConfigError, ConfigResult},
};

/// Parameters a fit may estimate.
pub const PARAM_NAMES: [&str; 8] = ["a", "tr", "v", "ssv", "z", "xb", "si", "sso"];

/// Initial value per base parameter.
pub type Inits = BTreeMap<String, f64>;

/// Default initial values for `kind`.
pub fn default_inits(kind: &ModelKind) -> Inits {
    let mut inits: Inits = [("a", 0.5), ("v", 1.2), ("xb", 1.5), ("tr", 0.2)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    if kind.is_dpm() {
        inits.insert("ssv".to_string(), -1.0);
    } else if kind.is_race() {
        inits.insert("ssv".to_string(), 1.0);
    }
    inits
}

/// Coerce `inits` to what `kind` and `depends_on` require.
///
/// - races / interactive races: `ssv` made positive; dpm: made negative;
/// - proactive models drop `ssv`;
/// - dynamic (`x`) kinds get `xb = 1.5` if absent, others drop `xb`;
/// - `si` gets `0.01` when conditioned on but absent;
/// - non-dpm kinds drop `z`;
/// - unknown names are discarded.
pub fn check_inits(mut inits: Inits, depends_on: &DependsOn, kind: &ModelKind) -> Inits {
    if let Some(ssv) = inits.get_mut("ssv") {
        if kind.is_race() || kind.is_iact() {
            *ssv = ssv.abs();
        } else if kind.is_dpm() {
            *ssv = -ssv.abs();
        }
    }
    if kind.is_pro() {
        inits.remove("ssv");
    }
    if kind.is_dynamic() {
        inits.entry("xb".to_string()).or_insert(1.5);
    } else {
        inits.remove("xb");
    }
    if depends_on.get("si").is_some() {
        inits.entry("si".to_string()).or_insert(0.01);
    }
    if !kind.is_dpm() {
        inits.remove("z");
    }
    inits.retain(|name, _| PARAM_NAMES.contains(&name.as_str()));
    inits
}

/// Search interval of `param` for `kind`, if defined.
pub fn bounds(kind: &ModelKind, param: &str) -> Option<(f64, f64)> {
    let b = match param {
        "a" => (0.05, 1.5),
        "tr" => (0.01, 0.5),
        "v" => (0.1, 5.0),
        "z" => (0.01, 0.79),
        "ssv" if kind.is_irace() => (0.1, 5.0),
        "ssv" => (-5.0, -0.1),
        "xb" => (0.1, 5.0),
        "si" => (0.001, 0.2),
        "sso" => (0.01, 0.5),
        "vd" => (0.6, 1.1),
        "vi" => (0.4, 0.8),
        _ => return None,
    };
    Some(b)
}

fn required_bounds(kind: &ModelKind, param: &str) -> ConfigResult<(f64, f64)> {
    bounds(kind, param).ok_or_else(|| ConfigError::MissingBounds { param: param.to_string() })
}

/// One optimizer coordinate or fixed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub value: f64,
    pub vary: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// `ParameterSet` — ordered parameter entries of one fit.
///
/// Conditional per-level entries come first (in pcmap order), then the
/// remaining parameters in name order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    entries: Vec<ParamSpec>,
}

impl ParameterSet {
    pub fn new(entries: Vec<ParamSpec>) -> ParameterSet {
        ParameterSet { entries }
    }

    pub fn entries(&self) -> &[ParamSpec] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the varying entries, in optimizer coordinate order.
    pub fn varying_names(&self) -> Vec<&str> {
        self.entries.iter().filter(|e| e.vary).map(|e| e.name.as_str()).collect()
    }

    /// Starting point of the varying coordinates.
    pub fn theta0(&self) -> Array1<f64> {
        self.entries.iter().filter(|e| e.vary).map(|e| e.value).collect()
    }

    /// `(lower, upper)` of the varying coordinates; unbounded sides are
    /// infinite.
    pub fn varying_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        self.entries
            .iter()
            .filter(|e| e.vary)
            .map(|e| (e.min.unwrap_or(f64::NEG_INFINITY), e.max.unwrap_or(f64::INFINITY)))
            .unzip()
    }

    /// Name → value map with varying entries taken from `theta`.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::ThetaLengthMismatch` if `theta` does not have one
    ///   value per varying entry.
    pub fn assemble(&self, theta: &[f64]) -> ConfigResult<BTreeMap<String, f64>> {
        let nvary = self.entries.iter().filter(|e| e.vary).count();
        if theta.len() != nvary {
            return Err(ConfigError::ThetaLengthMismatch { expected: nvary, actual: theta.len() });
        }
        let mut values = theta.iter();
        Ok(self
            .entries
            .iter()
            .map(|e| {
                let value = if e.vary { values.next().copied().unwrap_or(e.value) } else { e.value };
                (e.name.clone(), value)
            })
            .collect())
    }
}

/// Build the parameter set of a fit.
///
/// Errors
/// ------
/// - `ConfigError::MissingInit` for a conditional parameter without an
///   initial value.
/// - `ConfigError::MissingBounds` for a varying parameter without bounds.
pub fn load_parameters(
    inits: &Inits, pcmap: &ParamConditionMap, is_flat: bool, kind: &ModelKind,
) -> ConfigResult<ParameterSet> {
    let mut entries = Vec::new();
    let mut conditional: Vec<&str> = Vec::new();

    if !is_flat {
        for (param, names) in pcmap.iter() {
            let value =
                *inits.get(param).ok_or_else(|| ConfigError::MissingInit { param: param.to_string() })?;
            let (min, max) = required_bounds(kind, param)?;
            for name in names {
                entries.push(ParamSpec { name: name.clone(), value, vary: true, min: Some(min), max: Some(max) });
            }
            conditional.push(param);
        }
    }

    for (name, &value) in inits.iter().filter(|(n, _)| PARAM_NAMES.contains(&n.as_str())) {
        if conditional.contains(&name.as_str()) {
            continue;
        }
        let spec = if is_flat {
            let (min, max) = required_bounds(kind, name)?;
            ParamSpec { name: name.clone(), value, vary: true, min: Some(min), max: Some(max) }
        } else {
            ParamSpec { name: name.clone(), value, vary: false, min: None, max: None }
        };
        entries.push(spec);
    }

    Ok(ParameterSet { entries })
}

/// Lower and upper basin-hopping bounds for `keys`, each repeated
/// `nlevels` times.
pub fn basinhopping_bounds(keys: &[&str], nlevels: usize, kind: &ModelKind) -> ConfigResult<(Vec<f64>, Vec<f64>)> {
    let mut xmin = Vec::with_capacity(keys.len() * nlevels);
    let mut xmax = Vec::with_capacity(keys.len() * nlevels);
    for key in keys {
        let (lo, hi) = required_bounds(kind, key)?;
        xmin.extend(std::iter::repeat(lo).take(nlevels));
        xmax.extend(std::iter::repeat(hi).take(nlevels));
    }
    Ok((xmin, xmax))
}

/// Basin-hopping step scale per coordinate: the scales of `keys`, the whole
/// list repeated `nlevels` times.
pub fn stepsize_scalars(keys: &[&str], nlevels: usize) -> ConfigResult<Array1<f64>> {
    let scales: Vec<f64> = keys
        .iter()
        .map(|key| {
            let scale = match *key {
                "a" => 0.5,
                "tr" => 0.1,
                "v" | "vi" | "vd" | "ssv" | "xb" => 1.5,
                "z" => 0.1,
                "sso" => 0.1,
                _ => return Err(ConfigError::MissingStepScale { param: key.to_string() }),
            };
            Ok(scale)
        })
        .collect::<ConfigResult<_>>()?;
    Ok(scales.iter().copied().cycle().take(scales.len() * nlevels).collect())
}

/// Regroup optimized values: conditional parameters become their per-level
/// vectors (pcmap order), `params` not in the pcmap become one-element
/// vectors.
///
/// Errors
/// ------
/// - `ConfigError::MissingValue` for a name absent from `values`.
pub fn extract_popt(
    values: &BTreeMap<String, f64>, params: &[&str], pcmap: &ParamConditionMap,
) -> ConfigResult<BTreeMap<String, Vec<f64>>> {
    let mut popt = BTreeMap::new();
    for &param in params {
        if pcmap.contains(param) {
            continue;
        }
        let value =
            values.get(param).copied().ok_or_else(|| ConfigError::MissingValue { name: param.to_string() })?;
        popt.insert(param.to_string(), vec![value]);
    }
    for param in pcmap.params() {
        popt.insert(param.to_string(), pcmap.collect(param, values)?);
    }
    Ok(popt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::core::{
        conditions::ConditionSet,
        data::{Trial, TrialData},
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Default inits and the kind-dependent coercions.
    // - Bounds, including the independent-race stop-drift flip.
    // - Parameter-set layout for conditional and flat fits.
    // - Step scales, basin bounds and regrouping of optimized values.
    // -------------------------------------------------------------------------

    fn kind(tag: &str) -> ModelKind {
        ModelKind::new(tag).unwrap()
    }

    fn cond_pcmap() -> (DependsOn, ParamConditionMap) {
        let trials = ["easy", "hard"]
            .into_iter()
            .map(|c| Trial::go("s1", true, Some(0.5)).with_factor("cond", c))
            .collect();
        let data = TrialData::new(trials, 0.65).unwrap();
        let depends_on = DependsOn::new().with("v", "cond");
        let cset = ConditionSet::new(&data, &depends_on).unwrap();
        let pcmap = ParamConditionMap::new(&depends_on, &cset).unwrap();
        (depends_on, pcmap)
    }

    #[test]
    // Purpose
    // -------
    // Verify default inits and their coercion per model family.
    //
    // Given
    // -----
    // - Defaults for `xdpm`, `irace` and `pro`, each passed through
    //   `check_inits`, plus a `z` entry and an unknown `foo` entry.
    //
    // Expect
    // ------
    // - xdpm keeps xb and a negative ssv; irace drops xb and z and has a
    //   positive ssv; pro drops ssv; unknown names are discarded.
    fn inits_follow_model_family() {
        let flat = DependsOn::flat();

        let mut xdpm = default_inits(&kind("xdpm"));
        xdpm.insert("z".to_string(), 0.1);
        let xdpm = check_inits(xdpm, &flat, &kind("xdpm"));
        assert_eq!(xdpm["ssv"], -1.0);
        assert_eq!(xdpm["xb"], 1.5);
        assert_eq!(xdpm["z"], 0.1);

        let mut irace = default_inits(&kind("irace"));
        irace.insert("ssv".to_string(), -2.0);
        irace.insert("z".to_string(), 0.1);
        irace.insert("foo".to_string(), 3.0);
        let irace = check_inits(irace, &flat, &kind("irace"));
        assert_eq!(irace["ssv"], 2.0);
        assert!(!irace.contains_key("xb") && !irace.contains_key("z") && !irace.contains_key("foo"));

        let si_cond = DependsOn::new().with("si", "cond");
        let pro = check_inits(default_inits(&kind("xpro")), &si_cond, &kind("xpro"));
        assert!(!pro.contains_key("ssv"));
        assert_eq!(pro["si"], 0.01);
    }

    #[test]
    // Purpose
    // -------
    // Check stop-drift bounds per family.
    //
    // Given
    // -----
    // - `ssv` bounds for `dpm` and `irace`; an unknown parameter.
    //
    // Expect
    // ------
    // - `(-5, -0.1)` vs `(0.1, 5)`; `None` for the unknown name.
    fn ssv_bounds_flip_for_independent_race() {
        assert_eq!(bounds(&kind("dpm"), "ssv"), Some((-5.0, -0.1)));
        assert_eq!(bounds(&kind("irace"), "ssv"), Some((0.1, 5.0)));
        assert_eq!(bounds(&kind("dpm"), "foo"), None);
    }

    #[test]
    // Purpose
    // -------
    // Verify parameter-set layout for conditional and flat fits.
    //
    // Given
    // -----
    // - `{v: cond}` with levels easy/hard and dpm defaults.
    //
    // Expect
    // ------
    // - Conditional: v_easy, v_hard vary within v's bounds, others fixed.
    // - Flat: every base parameter varies; no per-level names.
    // - `assemble` puts θ into the varying slots and checks its length.
    fn load_parameters_conditional_and_flat() {
        let (depends_on, pcmap) = cond_pcmap();
        let k = kind("dpm");
        let inits = check_inits(default_inits(&k), &depends_on, &k);

        let cond = load_parameters(&inits, &pcmap, false, &k).unwrap();
        assert_eq!(cond.varying_names(), vec!["v_easy", "v_hard"]);
        assert_eq!(cond.get("v_hard").unwrap().max, Some(5.0));
        assert!(!cond.get("a").unwrap().vary);
        assert_eq!(cond.theta0().to_vec(), vec![1.2, 1.2]);

        let values = cond.assemble(&[1.0, 2.0]).unwrap();
        assert_eq!(values["v_hard"], 2.0);
        assert_eq!(values["a"], 0.5);
        assert_eq!(
            cond.assemble(&[1.0]).unwrap_err(),
            ConfigError::ThetaLengthMismatch { expected: 2, actual: 1 }
        );

        let flat = load_parameters(&inits, &pcmap, true, &k).unwrap();
        assert_eq!(flat.varying_names(), vec!["a", "ssv", "tr", "v"]);
        assert!(flat.get("v_easy").is_none());

        let missing = load_parameters(&Inits::new(), &pcmap, false, &k).unwrap_err();
        assert_eq!(missing, ConfigError::MissingInit { param: "v".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Verify step scales, basin bounds and regrouping.
    //
    // Given
    // -----
    // - Keys [a, v] with `nlevels = 2`; optimized values for a dpm `{v: cond}`
    //   fit.
    //
    // Expect
    // ------
    // - Scales `[.5, 1.5, .5, 1.5]`; bounds repeated per level; `si` has no
    //   step scale; `popt[v] == [V1, V2]`, `popt[a] == [A]`.
    fn global_search_helpers_and_popt() {
        assert_eq!(stepsize_scalars(&["a", "v"], 2).unwrap().to_vec(), vec![0.5, 1.5, 0.5, 1.5]);
        assert_eq!(
            stepsize_scalars(&["si"], 1).unwrap_err(),
            ConfigError::MissingStepScale { param: "si".to_string() }
        );

        let (xmin, xmax) = basinhopping_bounds(&["a", "v"], 2, &kind("dpm")).unwrap();
        assert_eq!(xmin, vec![0.05, 0.05, 0.1, 0.1]);
        assert_eq!(xmax, vec![1.5, 1.5, 5.0, 5.0]);

        let (_, pcmap) = cond_pcmap();
        let values: BTreeMap<String, f64> = [("a", 0.4), ("v_easy", 1.1), ("v_hard", 0.9)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let popt = extract_popt(&values, &["a", "v"], &pcmap).unwrap();
        assert_eq!(popt["v"], vec![1.1, 0.9]);
        assert_eq!(popt["a"], vec![0.4]);
    }
}
