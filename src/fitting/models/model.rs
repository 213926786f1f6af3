//! FitModel — owner of a fit configuration and its derived artifacts.
//!
//! Purpose
//! -------
//! Tie validated trial data to everything a fit needs: the condition set,
//! the parameter-condition map, observed vectors and weights, the SSD
//! layout, and the published fit/basin parameter records. Setters merge
//! typed overrides, rebuild exactly the artifacts that depend on what
//! changed, and report those artifacts as a list of [`Component`]s.
//!
//! Key behaviors
//! -------------
//! - Construction builds the default records ([`StoreState::Default`]);
//!   later setters merge overrides ([`StoreState::Active`]).
//! - `quantiles` changes rebuild observed data. `depends_on` changes
//!   rebuild conditions, pcmap and model id, and rebuild observed data when
//!   the previous configuration was flat or the condition set changed
//!   (factors, levels or combos).
//! - Every mutation reselects the active `y`/`wts`/`idx` and, when the data
//!   has stop trials, re-resolves the SSD layout.
//! - Mutations are staged on copies and committed only once every step
//!   succeeded; a failing setter leaves the previous records published.
//! - Each commit bumps a revision; [`FitModel::notify`] refreshes stale
//!   [`FitCollaborator`]s with a new [`FitSnapshot`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `fitparams.y.len() == fitparams.wts.len()` and equals `ncols` (flat)
//!   or `ncols * nlevels` (conditional).
//! - The pcmap, condition set and observed data always derive from the
//!   same `depends_on`.
use tracing::debug;

use crate::fitting::{
    core::{
        conditions::{ConditionSet, DependsOn, prepare_data},
        data::TrialData,
        observed::{ObservedData, SparsityFlag},
        options::{FitOn, Force, ModelKind, ObservedOptions},
        pcmap::ParamConditionMap,
        ssd::SsdTable,
    },
    errors::{ConfigError, ConfigResult, FitResult},
    models::collaborator::{FitCollaborator, FitSnapshot},
    params::{
        basinparams::{BasinOverrides, BasinParams},
        fitparams::{
            DEFAULT_DT, DEFAULT_MAXFEV, DEFAULT_MAXITER, DEFAULT_METHOD, DEFAULT_NTRIALS, DEFAULT_SI,
            DEFAULT_TOL, FitOverrides, FitParams,
        },
        store::{ParamStore, StoreState},
        theta::{Inits, ParameterSet, check_inits, default_inits, load_parameters},
    },
};

/// Downstream artifact rebuilt by a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Conditions,
    ParamMap,
    ModelId,
    ObservedData,
    ActiveVectors,
    SsdInfo,
    BasinParams,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Conditions => "conditions",
            Component::ParamMap => "pcmap",
            Component::ModelId => "model_id",
            Component::ObservedData => "observed",
            Component::ActiveVectors => "active_vectors",
            Component::SsdInfo => "ssd_info",
            Component::BasinParams => "basinparams",
        }
    }
}

/// ModelOptions — construction-time configuration of a [`FitModel`].
///
/// Fields
/// ------
/// - `kind`: model family tag.
/// - `depends_on`: parameter → factor dependencies (flat by default).
/// - `observed`: quantiles, granularity, weighting and bootstrap knobs.
/// - `inits`: initial values; kind defaults when `None`.
/// - `learn`, `ssd_method`: simulator switches passed through to the
///   fit parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    pub kind: ModelKind,
    pub depends_on: DependsOn,
    pub observed: ObservedOptions,
    pub inits: Option<Inits>,
    pub learn: bool,
    pub ssd_method: Option<String>,
}

impl Default for ModelOptions {
    fn default() -> ModelOptions {
        ModelOptions {
            kind: ModelKind::default(),
            depends_on: DependsOn::flat(),
            observed: ObservedOptions::default(),
            inits: None,
            learn: false,
            ssd_method: None,
        }
    }
}

/// Identifier `"{kind}_{params...}_{avg|idx}[_{append}]"`; a spec on the
/// `"all"` pseudo-parameter contributes `"flat"`.
pub fn model_id(
    kind: &ModelKind, depends_on: &DependsOn, fit_on: FitOn, append: Option<&str>,
) -> String {
    let params = depends_on.params();
    let mut parts: Vec<&str> = vec![kind.as_str()];
    if params.contains(&"all") {
        parts.push("flat");
    } else {
        parts.extend(params);
    }
    parts.push(fit_on.id_tag());
    if let Some(append) = append {
        parts.push(append);
    }
    parts.join("_")
}

#[derive(Debug, Clone)]
struct Layout {
    data: TrialData,
    depends_on: DependsOn,
    conditions: ConditionSet,
    pcmap: ParamConditionMap,
    observed: ObservedData,
    ssd_table: Option<SsdTable>,
}

impl Layout {
    fn build(raw: &TrialData, depends_on: &DependsOn, options: &ObservedOptions) -> FitResult<Layout> {
        let data = prepare_data(raw, depends_on);
        let conditions = ConditionSet::new(&data, depends_on)?;
        let pcmap = ParamConditionMap::new(depends_on, &conditions)?;
        let observed = ObservedData::build(&data, &conditions, options)?;
        let ssd_table = SsdTable::from_trials(&data, &conditions);
        Ok(Layout { data, depends_on: depends_on.clone(), conditions, pcmap, observed, ssd_table })
    }
}

fn mark(components: &mut Vec<Component>, component: Component) {
    if !components.contains(&component) {
        components.push(component);
    }
}

/// `FitModel` — fit configuration owner.
#[derive(Debug, Clone)]
pub struct FitModel {
    raw: TrialData,
    kind: ModelKind,
    options: ObservedOptions,
    learn: bool,
    ssd_method: Option<String>,
    layout: Layout,
    inits: Inits,
    model_id: String,
    id_suffix: Option<String>,
    fitparams: ParamStore<FitParams>,
    basinparams: ParamStore<BasinParams>,
    revision: u64,
}

impl FitModel {
    /// Build a model and publish the default fit and basin records.
    ///
    /// Errors
    /// ------
    /// - Any configuration error of `options` (dependencies, quantiles,
    ///   bootstrap knobs).
    /// - Data errors raised while building conditions, observed data or
    ///   the SSD layout.
    pub fn new(data: TrialData, options: ModelOptions) -> FitResult<FitModel> {
        let ModelOptions { kind, depends_on, observed, inits, learn, ssd_method } = options;
        observed.validate()?;

        let layout = Layout::build(&data, &depends_on, &observed)?;
        let inits = check_inits(inits.unwrap_or_else(|| default_inits(&kind)), &depends_on, &kind);
        let model_id = model_id(&kind, &depends_on, observed.fit_on, None);

        let mut model = FitModel {
            raw: data,
            kind,
            options: observed,
            learn,
            ssd_method,
            layout,
            inits,
            model_id,
            id_suffix: None,
            fitparams: ParamStore::new(),
            basinparams: ParamStore::new(),
            revision: 0,
        };
        model.set_fitparams(None, FitOverrides::default())?;
        model.set_basinparams(BasinOverrides::default())?;
        Ok(model)
    }

    fn default_fitparams(&self) -> FitParams {
        let layout = &self.layout;
        FitParams {
            ix: 0,
            ntrials: DEFAULT_NTRIALS,
            si: DEFAULT_SI,
            dt: DEFAULT_DT,
            tol: DEFAULT_TOL,
            method: DEFAULT_METHOD.to_string(),
            maxfev: DEFAULT_MAXFEV,
            maxiter: DEFAULT_MAXITER,
            kind: self.kind.clone(),
            clmap: layout.conditions.clmap().clone(),
            pcmap: layout.pcmap.clone(),
            depends_on: layout.depends_on.clone(),
            ssd_method: self.ssd_method.clone(),
            quantiles: self.options.quantiles.clone(),
            fit_on: self.options.fit_on,
            model_id: self.model_id.clone(),
            learn: self.learn,
            inits: self.inits.clone(),
            nlevels: 1,
            nidx: self.raw.nsubjects(),
            idx: layout.observed.units().first().cloned().unwrap_or_default(),
            tb: self.raw.tb(),
            y: Default::default(),
            wts: Default::default(),
            ssd_info: None,
        }
    }

    /// Merge `overrides` into the fit parameters and rebuild what they
    /// invalidate.
    ///
    /// Parameters
    /// ----------
    /// - `force`: `Cond` targets conditional vectors (`nlevels` of the
    ///   condition set), `Flat` targets flat vectors; `None` keeps the
    ///   current `nlevels` (or the one implied by a `depends_on` change).
    /// - `overrides`: typed partial update.
    ///
    /// Returns
    /// -------
    /// The rebuilt components, in rebuild order.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::IndexOutOfRange` for an `ix` beyond the unit count.
    /// - Validation errors for numeric knobs, quantiles or dependencies.
    /// - Data errors from rebuilding conditions, observed data or SSDs.
    ///
    /// On error nothing is committed.
    pub fn set_fitparams(
        &mut self, force: Option<Force>, overrides: FitOverrides,
    ) -> FitResult<Vec<Component>> {
        let mut components = Vec::new();
        let mut params = match self.fitparams.current() {
            Some(current) => current.clone(),
            None => self.default_fitparams(),
        };
        overrides.merge_scalars(&mut params);
        params.validate()?;

        let mut options = self.options.clone();
        let mut layout = self.layout.clone();
        let mut inits = self.inits.clone();
        let mut model_id = self.model_id.clone();

        if let Some(quantiles) = &overrides.quantiles {
            options.quantiles = quantiles.clone();
            layout.observed = ObservedData::build(&layout.data, &layout.conditions, &options)?;
            params.quantiles = quantiles.clone();
            mark(&mut components, Component::ObservedData);
        }

        if let Some(depends_on) = &overrides.depends_on {
            let was_flat = layout.conditions.is_flat();
            let data = prepare_data(&self.raw, depends_on);
            let conditions = ConditionSet::new(&data, depends_on)?;
            let pcmap = ParamConditionMap::new(depends_on, &conditions)?;
            mark(&mut components, Component::Conditions);
            mark(&mut components, Component::ParamMap);

            if was_flat || conditions != layout.conditions {
                layout.observed = ObservedData::build(&data, &conditions, &options)?;
                mark(&mut components, Component::ObservedData);
            }
            layout.ssd_table = SsdTable::from_trials(&data, &conditions);
            layout.data = data;
            layout.depends_on = depends_on.clone();
            layout.conditions = conditions;
            layout.pcmap = pcmap;

            let suffix = self.id_suffix.as_deref();
            model_id = self::model_id(&self.kind, depends_on, options.fit_on, suffix);
            mark(&mut components, Component::ModelId);
            inits = check_inits(inits, depends_on, &self.kind);

            params.depends_on = layout.depends_on.clone();
            params.clmap = layout.conditions.clmap().clone();
            params.pcmap = layout.pcmap.clone();
            params.model_id = model_id.clone();
            params.nlevels = layout.conditions.nlevels();
        }

        if let Some(new_inits) = &overrides.inits {
            inits = check_inits(new_inits.clone(), &layout.depends_on, &self.kind);
        }
        params.inits = inits.clone();

        match force {
            Some(Force::Cond) => params.nlevels = layout.conditions.nlevels(),
            Some(Force::Flat) => params.nlevels = 1,
            None => {}
        }

        Self::resolve_active(&mut params, &layout, &mut components)?;

        self.options = options;
        self.layout = layout;
        self.inits = inits;
        self.model_id = model_id;
        let version = self.fitparams.publish(params);
        self.revision += 1;
        debug!(version, revision = self.revision, ?components, "committed fit parameters");
        Ok(components)
    }

    /// Reselect `y`/`wts`/`idx` for the active unit and re-resolve SSDs.
    fn resolve_active(
        params: &mut FitParams, layout: &Layout, components: &mut Vec<Component>,
    ) -> FitResult<()> {
        let (y, wts) = layout.observed.select(params.ix, params.nlevels)?;
        params.y = y;
        params.wts = wts;
        params.idx = layout.observed.units()[params.ix].clone();
        mark(components, Component::ActiveVectors);

        params.ssd_info = match &layout.ssd_table {
            Some(table) => {
                mark(components, Component::SsdInfo);
                Some(table.resolve(params.fit_on, params.ix, params.nlevels, params.ntrials)?)
            }
            None => None,
        };
        Ok(())
    }

    /// Merge `overrides` into the basin parameters.
    ///
    /// Errors
    /// ------
    /// - Validation errors of the merged record; nothing is committed.
    pub fn set_basinparams(&mut self, overrides: BasinOverrides) -> FitResult<Vec<Component>> {
        let next = match self.basinparams.current() {
            Some(current) => overrides.apply(current),
            None => overrides.apply(&BasinParams::default()),
        };
        next.validate()?;
        let version = self.basinparams.publish(next);
        self.revision += 1;
        debug!(version, revision = self.revision, "committed basin parameters");
        Ok(vec![Component::BasinParams])
    }

    /// Switch the dependency spec. Same as `set_fitparams` with only
    /// `depends_on` set.
    pub fn set_conditions(&mut self, depends_on: DependsOn) -> FitResult<Vec<Component>> {
        self.set_fitparams(None, FitOverrides::new().depends_on(depends_on))
    }

    /// Select flat (`nlevels == 1`) or conditional vectors for the active
    /// unit without touching any other field.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::InvalidLevelCount` unless `nlevels` is 1 or the
    ///   condition set's level count.
    pub fn update_data(&mut self, nlevels: usize) -> FitResult<Vec<Component>> {
        let expected = self.layout.conditions.nlevels();
        if nlevels != 1 && nlevels != expected {
            return Err(ConfigError::InvalidLevelCount { nlevels, expected }.into());
        }
        let mut params = match self.fitparams.current() {
            Some(current) => current.clone(),
            None => self.default_fitparams(),
        };
        params.nlevels = nlevels;
        let mut components = Vec::new();
        Self::resolve_active(&mut params, &self.layout, &mut components)?;
        self.fitparams.publish(params);
        self.revision += 1;
        Ok(components)
    }

    /// Rebuild the model id with an optional suffix and republish it.
    pub fn generate_model_id(&mut self, append: Option<&str>) -> &str {
        self.id_suffix = append.map(str::to_string);
        self.model_id = model_id(&self.kind, &self.layout.depends_on, self.options.fit_on, append);
        if let Some(current) = self.fitparams.current() {
            let mut params = current.clone();
            params.model_id = self.model_id.clone();
            self.fitparams.publish(params);
            self.revision += 1;
        }
        &self.model_id
    }

    /// Loosen tolerances and shrink search budgets for quick test fits.
    pub fn set_testing_params(&mut self) -> FitResult<Vec<Component>> {
        let mut components = self.set_fitparams(None, FitOverrides::new().tol(1e-20).maxfev(1000))?;
        let basin = BasinOverrides {
            tol: Some(1e-20),
            ninits: Some(2),
            nsamples: Some(1000),
            nsuccess: Some(50),
            ..BasinOverrides::default()
        };
        components.extend(self.set_basinparams(basin)?);
        Ok(components)
    }

    /// Parameter set for the active fit: per-level entries when the active
    /// fit is conditional, flat entries otherwise.
    pub fn load_parameters(&self) -> ConfigResult<ParameterSet> {
        let is_flat = self.fitparams.current().map_or(true, |p| p.nlevels == 1);
        load_parameters(&self.inits, &self.layout.pcmap, is_flat, &self.kind)
    }

    /// Current snapshot of both published records.
    pub fn snapshot(&self) -> Option<FitSnapshot> {
        Some(FitSnapshot {
            revision: self.revision,
            fitparams: self.fitparams.snapshot()?,
            basinparams: self.basinparams.snapshot()?,
        })
    }

    /// Refresh `collaborator` if it is behind. Returns whether it was.
    pub fn notify(&self, collaborator: &mut dyn FitCollaborator) -> bool {
        if !collaborator.is_stale(self.revision) {
            return false;
        }
        match self.snapshot() {
            Some(snapshot) => {
                collaborator.refresh(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn fitparams(&self) -> Option<&FitParams> {
        self.fitparams.current()
    }

    pub fn basinparams(&self) -> Option<&BasinParams> {
        self.basinparams.current()
    }

    pub fn fit_state(&self) -> StoreState {
        self.fitparams.state()
    }

    pub fn basin_state(&self) -> StoreState {
        self.basinparams.state()
    }

    /// Commits so far, across both records.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn inits(&self) -> &Inits {
        &self.inits
    }

    pub fn depends_on(&self) -> &DependsOn {
        &self.layout.depends_on
    }

    /// Prepared trials (with the `"flat"` factor for flat specs).
    pub fn data(&self) -> &TrialData {
        &self.layout.data
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.layout.conditions
    }

    pub fn pcmap(&self) -> &ParamConditionMap {
        &self.layout.pcmap
    }

    pub fn observed(&self) -> &ObservedData {
        &self.layout.observed
    }

    pub fn observed_options(&self) -> &ObservedOptions {
        &self.options
    }

    /// Sparse cells of the current observed data.
    pub fn sparsity(&self) -> &[SparsityFlag] {
        self.layout.observed.sparsity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::{
        core::{data::Trial, quantiles::Quantiles},
        errors::FitError,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Default records, lifecycle states and model ids.
    // - Rebuild cascades and the reported components.
    // - Atomicity of failing setters and collaborator notification.
    //
    // They intentionally DO NOT cover:
    // - Multi-subject scenarios, covered in the integration tests.
    // -------------------------------------------------------------------------

    fn data() -> TrialData {
        let mut trials = Vec::new();
        for (cond, base) in [("easy", 0.40), ("hard", 0.45)] {
            for i in 0..40 {
                let rt = Some(base + 0.003 * i as f64);
                trials.push(Trial::go("s1", i % 8 != 0, rt).with_factor("cond", cond));
            }
            for ssd in [0.2, 0.25, 0.3] {
                trials.push(Trial::stop("s1", ssd, false, None).with_factor("cond", cond));
            }
        }
        TrialData::new(trials, 0.65).unwrap()
    }

    fn options() -> ModelOptions {
        let observed = ObservedOptions { n_boot: 40, ..ObservedOptions::default() };
        ModelOptions { observed, ..ModelOptions::default() }
    }

    #[derive(Default)]
    struct Recorder {
        revision: Option<u64>,
        nlevels: Option<usize>,
    }

    impl FitCollaborator for Recorder {
        fn synced_revision(&self) -> Option<u64> {
            self.revision
        }

        fn refresh(&mut self, snapshot: &FitSnapshot) {
            self.revision = Some(snapshot.revision);
            self.nlevels = Some(snapshot.fitparams.nlevels);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the default record after construction.
    //
    // Given
    // -----
    // - One subject, flat spec, default options.
    //
    // Expect
    // ------
    // - Documented defaults, `idx == "avg"`, flat `y` of length 10, an SSD
    //   layout with 3 delays, model id `xdpm_flat_avg`, state Default.
    fn new_publishes_defaults() {
        let model = FitModel::new(data(), options()).unwrap();
        let fp = model.fitparams().unwrap();

        assert_eq!(model.fit_state(), StoreState::Default);
        assert_eq!(model.basin_state(), StoreState::Default);
        assert_eq!((fp.ix, fp.ntrials, fp.maxfev, fp.nlevels), (0, 20000, 450, 1));
        assert_eq!(fp.method, "nelder");
        assert_eq!(fp.idx, "avg");
        assert_eq!(fp.y.len(), 10);
        assert_eq!(fp.y.len(), fp.wts.len());
        assert_eq!(fp.ssd_info.as_ref().unwrap().nssd, 3);
        assert_eq!(fp.model_id, "xdpm_flat_avg");
        assert_eq!(model.basinparams().unwrap().nsamples, 1200);
    }

    #[test]
    // Purpose
    // -------
    // Verify the cascade of a `depends_on` change and of `force`.
    //
    // Given
    // -----
    // - A flat model switched to `{v: cond}`, then forced flat.
    //
    // Expect
    // ------
    // - Components Conditions, ParamMap, ObservedData, ModelId,
    //   ActiveVectors, SsdInfo; `nlevels == 2`; `y` of length 20; id
    //   `xdpm_v_avg`. Forcing flat returns to a length-10 `y`.
    fn depends_on_change_cascades() {
        let mut model = FitModel::new(data(), options()).unwrap();

        let components = model.set_conditions(DependsOn::new().with("v", "cond")).unwrap();
        assert_eq!(
            components,
            vec![
                Component::Conditions,
                Component::ParamMap,
                Component::ObservedData,
                Component::ModelId,
                Component::ActiveVectors,
                Component::SsdInfo,
            ]
        );
        let fp = model.fitparams().unwrap();
        assert_eq!(fp.nlevels, 2);
        assert_eq!(fp.y.len(), 20);
        assert_eq!(fp.model_id, "xdpm_v_avg");
        assert_eq!(fp.ssd_info.as_ref().unwrap().ssd.nrows(), 2);
        assert_eq!(model.fit_state(), StoreState::Active);

        model.set_fitparams(Some(Force::Flat), FitOverrides::new()).unwrap();
        assert_eq!(model.fitparams().unwrap().y.len(), 10);
        assert_eq!(model.fitparams().unwrap().ssd_info.as_ref().unwrap().ssd.nrows(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a failing setter commits nothing.
    //
    // Given
    // -----
    // - A model at revision r; an override with `ix = 5` (one unit only)
    //   combined with a quantile change.
    //
    // Expect
    // ------
    // - `IndexOutOfRange`; the record, quantiles and revision are unchanged.
    fn failing_setter_is_atomic() {
        let mut model = FitModel::new(data(), options()).unwrap();
        let before = model.fitparams().unwrap().clone();
        let revision = model.revision();

        let q = Quantiles::new(vec![0.5]).unwrap();
        let err = model.set_fitparams(None, FitOverrides::new().ix(5).quantiles(q)).unwrap_err();

        assert_eq!(err, FitError::Config(ConfigError::IndexOutOfRange { ix: 5, len: 1 }));
        assert_eq!(model.fitparams().unwrap(), &before);
        assert_eq!(model.observed().ncols(), 10);
        assert_eq!(model.revision(), revision);
    }

    #[test]
    // Purpose
    // -------
    // Ensure switching between two factors with identical level names
    // regroups the observed data.
    //
    // Given
    // -----
    // - Crossed factors `block` and `session`, both with levels "1"/"2";
    //   RTs depend on `block` only.
    // - A `{v: block}` model switched to `{v: session}`.
    //
    // Expect
    // ------
    // - ObservedData is rebuilt and the vectors equal those of a model built
    //   directly with `{v: session}`.
    fn same_level_factor_switch_rebuilds_observed() {
        let mut trials = Vec::new();
        for block in 1..=2 {
            for session in 1..=2 {
                for i in 0..30 {
                    let rt = Some(0.3 * block as f64 + 0.002 * i as f64);
                    let trial = Trial::go("s1", i % 6 != 0, rt)
                        .with_factor("block", block)
                        .with_factor("session", session);
                    trials.push(trial);
                }
            }
        }
        let data = TrialData::new(trials, 0.9).unwrap();
        let by = |factor: &str| ModelOptions { depends_on: DependsOn::new().with("v", factor), ..options() };

        let mut model = FitModel::new(data.clone(), by("block")).unwrap();
        let components = model.set_conditions(DependsOn::new().with("v", "session")).unwrap();
        let fresh = FitModel::new(data, by("session")).unwrap();

        assert!(components.contains(&Component::ObservedData));
        assert_eq!(model.conditions(), fresh.conditions());
        assert_eq!(model.observed().observed(), fresh.observed().observed());
        assert_eq!(model.observed().cond_wts(), fresh.observed().cond_wts());
    }

    #[test]
    // Purpose
    // -------
    // Verify a successful quantile change rebuilds observed data and
    // republishes vectors of the new length.
    //
    // Given
    // -----
    // - A `{v: cond}` model; quantiles [0.3, 0.5, 0.7] applied flat, then
    //   the conditional fit forced.
    //
    // Expect
    // ------
    // - Components ObservedData, ActiveVectors, SsdInfo; flat `y`/`wts` of
    //   length 1 + 3; conditional `y`/`wts` of length (1 + 3) * 2.
    fn quantile_change_republishes_vectors() {
        let opts = ModelOptions { depends_on: DependsOn::new().with("v", "cond"), ..options() };
        let mut model = FitModel::new(data(), opts).unwrap();
        let q = Quantiles::new(vec![0.3, 0.5, 0.7]).unwrap();

        let components = model.set_fitparams(Some(Force::Flat), FitOverrides::new().quantiles(q)).unwrap();
        assert_eq!(components, vec![Component::ObservedData, Component::ActiveVectors, Component::SsdInfo]);
        let fp = model.fitparams().unwrap();
        assert_eq!(fp.quantiles.len(), 3);
        assert_eq!((fp.y.len(), fp.wts.len()), (4, 4));

        model.set_fitparams(Some(Force::Cond), FitOverrides::new()).unwrap();
        let fp = model.fitparams().unwrap();
        assert_eq!((fp.y.len(), fp.wts.len()), (8, 8));
        assert_eq!(model.observed().ncols(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Ensure `update_data` only accepts flat or full conditional counts.
    //
    // Given
    // -----
    // - A `{v: cond}` model (2 levels).
    //
    // Expect
    // ------
    // - `nlevels = 3` fails with `InvalidLevelCount` and commits nothing;
    //   `nlevels = 1` and `2` succeed.
    fn update_data_rejects_foreign_level_counts() {
        let opts = ModelOptions { depends_on: DependsOn::new().with("v", "cond"), ..options() };
        let mut model = FitModel::new(data(), opts).unwrap();
        let revision = model.revision();

        let err = model.update_data(3).unwrap_err();
        assert_eq!(err, FitError::Config(ConfigError::InvalidLevelCount { nlevels: 3, expected: 2 }));
        assert_eq!(model.revision(), revision);

        model.update_data(1).unwrap();
        assert_eq!(model.fitparams().unwrap().y.len(), 10);
        model.update_data(2).unwrap();
        assert_eq!(model.fitparams().unwrap().y.len(), 20);
    }

    #[test]
    // Purpose
    // -------
    // Verify snapshot-and-notify.
    //
    // Given
    // -----
    // - A fresh collaborator; a model notified twice, then mutated and
    //   notified again.
    //
    // Expect
    // ------
    // - First notify refreshes, second is a no-op, the mutation makes it
    //   stale again and the refreshed view carries the new `nlevels`.
    fn notify_refreshes_stale_collaborators() {
        let mut model = FitModel::new(data(), options()).unwrap();
        let mut recorder = Recorder::default();

        assert!(model.notify(&mut recorder));
        assert!(!model.notify(&mut recorder));
        assert_eq!(recorder.nlevels, Some(1));

        model.set_conditions(DependsOn::new().with("v", "cond")).unwrap();
        assert!(model.notify(&mut recorder));
        assert_eq!(recorder.nlevels, Some(2));
        assert_eq!(recorder.revision, Some(model.revision()));
    }

    #[test]
    // Purpose
    // -------
    // Verify testing parameters, id suffixes and the active parameter set.
    //
    // Given
    // -----
    // - A `{v: cond}` model; `set_testing_params`; an id suffix "boot".
    //
    // Expect
    // ------
    // - tol 1e-20, maxfev 1000, ninits 2, nsuccess 50; id `xdpm_v_avg_boot`;
    //   conditional parameter set varies v_easy / v_hard.
    fn testing_params_and_model_id_suffix() {
        let opts = ModelOptions { depends_on: DependsOn::new().with("v", "cond"), ..options() };
        let mut model = FitModel::new(data(), opts).unwrap();

        model.set_testing_params().unwrap();
        let fp = model.fitparams().unwrap();
        assert_eq!((fp.tol, fp.maxfev), (1e-20, 1000));
        let bp = model.basinparams().unwrap();
        assert_eq!((bp.ninits, bp.nsamples, bp.nsuccess, bp.tol), (2, 1000, 50, 1e-20));

        assert_eq!(model.generate_model_id(Some("boot")), "xdpm_v_avg_boot");
        assert_eq!(model.fitparams().unwrap().model_id, "xdpm_v_avg_boot");

        let flat = model.load_parameters().unwrap();
        assert_eq!(flat.varying_names(), vec!["a", "ssv", "tr", "v", "xb"]);
        model.update_data(2).unwrap();
        assert_eq!(model.load_parameters().unwrap().varying_names(), vec!["v_easy", "v_hard"]);
    }
}
