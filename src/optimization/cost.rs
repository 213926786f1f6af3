//! Weighted least-squares cost over simulated summary vectors.
//!
//! The optimizer proposes θ (the varying entries of a [`ParameterSet`]);
//! the cost assembles the full name → value map, asks a [`Simulator`] for
//! the predicted vector `ŷ` laid out like the fit record's `y`, and returns
//! `Σ ((ŷ − y) · wts)²`.
use std::collections::BTreeMap;

use argmin::core::{CostFunction, Error};
use ndarray::{Array1, ArrayView1, Zip};

use crate::{
    fitting::{
        errors::FitResult,
        params::{FitParams, ParameterSet},
    },
    optimization::errors::{OptError, OptResult},
};

/// Optimizer parameter vector: the varying entries of a [`ParameterSet`].
pub type Theta = Array1<f64>;

/// Produces predicted summary vectors for a full parameter map.
///
/// Implementations return a vector with the layout of `fitparams.y`:
/// accuracy then quantiles, per level when `fitparams.nlevels > 1`.
pub trait Simulator {
    fn simulate(
        &self, params: &BTreeMap<String, f64>, fitparams: &FitParams,
    ) -> FitResult<Array1<f64>>;
}

/// `Σ ((yhat − y) · wts)²`.
///
/// Errors
/// ------
/// - `OptError::PredictionLength` if `yhat` and `y` differ in length.
/// - `OptError::WeightLength` if `wts` and `y` differ in length.
/// - `OptError::NonFiniteCost` if the sum is not finite.
pub fn weighted_sse(
    y: ArrayView1<f64>, yhat: ArrayView1<f64>, wts: ArrayView1<f64>,
) -> OptResult<f64> {
    if yhat.len() != y.len() {
        return Err(OptError::PredictionLength { expected: y.len(), actual: yhat.len() });
    }
    if wts.len() != y.len() {
        return Err(OptError::WeightLength { y: y.len(), wts: wts.len() });
    }
    let mut sse = 0.0;
    Zip::from(&y).and(&yhat).and(&wts).for_each(|&obs, &pred, &w| {
        let r = (pred - obs) * w;
        sse += r * r;
    });
    if !sse.is_finite() {
        return Err(OptError::NonFiniteCost { value: sse });
    }
    Ok(sse)
}

/// Bridges a [`Simulator`] and a fit record to `argmin`'s `CostFunction`.
#[derive(Debug, Clone)]
pub struct WlsCost<'a, S: Simulator> {
    pub simulator: &'a S,
    pub parameters: &'a ParameterSet,
    pub fitparams: &'a FitParams,
}

impl<'a, S: Simulator> WlsCost<'a, S> {
    pub fn new(simulator: &'a S, parameters: &'a ParameterSet, fitparams: &'a FitParams) -> Self {
        Self { simulator, parameters, fitparams }
    }

    /// Cost at `theta` with crate errors.
    pub fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
        let values = self.parameters.assemble(&theta.to_vec())?;
        let yhat = self.simulator.simulate(&values, self.fitparams)?;
        weighted_sse(self.fitparams.y.view(), yhat.view(), self.fitparams.wts.view())
    }
}

impl<'a, S: Simulator> CostFunction for WlsCost<'a, S> {
    type Param = Theta;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(theta)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::{
        errors::ConfigError,
        params::{ParamSpec, fitparams::tests::sample},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The weighted SSE and its shape checks.
    // - θ assembly and simulator wiring through `CostFunction`.
    // -------------------------------------------------------------------------

    /// Predicts `y + v`, so the residual is the drift value itself.
    struct Shifted;

    impl Simulator for Shifted {
        fn simulate(
            &self, params: &BTreeMap<String, f64>, fitparams: &FitParams,
        ) -> FitResult<Array1<f64>> {
            Ok(&fitparams.y + params["v"])
        }
    }

    fn parameters() -> ParameterSet {
        ParameterSet::new(vec![
            ParamSpec { name: "a".into(), value: 0.5, vary: false, min: None, max: None },
            ParamSpec { name: "v".into(), value: 1.2, vary: true, min: Some(0.0), max: Some(4.0) },
        ])
    }

    #[test]
    // Purpose
    // -------
    // Verify the weighted SSE and its length checks.
    //
    // Given
    // -----
    // - y = [1, 2], yhat = [2, 4], wts = [1, 0.5].
    //
    // Expect
    // ------
    // - (1·1)² + (2·0.5)² = 2; mismatched lengths are rejected.
    fn weighted_sse_matches_hand_computation() {
        let y = array![1.0, 2.0];
        let sse = weighted_sse(y.view(), array![2.0, 4.0].view(), array![1.0, 0.5].view()).unwrap();
        assert_relative_eq!(sse, 2.0);

        let err = weighted_sse(y.view(), array![1.0].view(), array![1.0, 1.0].view()).unwrap_err();
        assert_eq!(err, OptError::PredictionLength { expected: 2, actual: 1 });
        let err = weighted_sse(y.view(), y.view(), array![1.0].view()).unwrap_err();
        assert_eq!(err, OptError::WeightLength { y: 2, wts: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Verify the `CostFunction` path from θ to cost.
    //
    // Given
    // -----
    // - A 10-element record with unit weights and a simulator predicting
    //   `y + v`; θ = [0.3] for the single varying entry `v`.
    //
    // Expect
    // ------
    // - Cost 10 · 0.3²; a θ of the wrong length surfaces as a
    //   configuration error.
    fn cost_function_assembles_theta() {
        let fitparams = sample();
        let parameters = parameters();
        let cost = WlsCost::new(&Shifted, &parameters, &fitparams);

        assert_relative_eq!(cost.cost(&array![0.3]).unwrap(), 10.0 * 0.09, epsilon = 1e-12);

        let err = cost.evaluate(&array![0.3, 0.1]).unwrap_err();
        assert_eq!(err, OptError::from(ConfigError::ThetaLengthMismatch { expected: 1, actual: 2 }));
        let err: OptError = cost.cost(&array![0.3, 0.1]).unwrap_err().into();
        assert!(matches!(err, OptError::Fit(_)));
    }
}
