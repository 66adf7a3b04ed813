//! Portfolio statistics: expected return, standard deviation and
//! mean-variance utility.
//!
//! Every function here is pure and total. Weights are matched to assets by
//! position; a weight slice shorter than the portfolio counts the missing
//! trailing weights as zero and extra weights are ignored. Bounds and the
//! budget are not checked, that is the optimizer's job.

use nalgebra::{DMatrix, DVector};

use crate::model::Portfolio;
use crate::solver::SmoothObjective;

fn padded(portfolio: &Portfolio, weights: &[f64]) -> DVector<f64> {
    DVector::from_fn(portfolio.len(), |i, _| {
        weights.get(i).copied().unwrap_or(0.0)
    })
}

/// Expected portfolio return `Σ w_i μ_i`.
pub fn expected_return(portfolio: &Portfolio, weights: &[f64]) -> f64 {
    padded(portfolio, weights).dot(portfolio.returns())
}

/// Portfolio variance `sᵀ C s` with `s_i = w_i σ_i`, clamped to be non-negative.
pub fn variance(portfolio: &Portfolio, weights: &[f64]) -> f64 {
    let s = padded(portfolio, weights).component_mul(portfolio.volatilities());
    let c = portfolio.correlation().as_matrix();
    let var = s.dot(&(c * &s));
    // A near-singular correlation can leave a tiny negative value or -0.
    if var <= 0.0 {
        0.0
    } else {
        var
    }
}

/// Portfolio standard deviation.
pub fn std_dev(portfolio: &Portfolio, weights: &[f64]) -> f64 {
    variance(portfolio, weights).sqrt()
}

/// Expected return and standard deviation together.
///
/// A pure single-asset allocation reproduces that asset's own return and
/// volatility:
///
/// ```
/// use meanvar::prelude::*;
///
/// let p = Portfolio::new(
///     vec![Asset::risk_free(0.005), Asset::new(0.10, 0.16)],
///     CorrelationMatrix::identity(2),
/// )
/// .unwrap();
/// assert_eq!(mean_and_std(&p, &[0.0, 1.0]), (0.10, 0.16));
/// ```
pub fn mean_and_std(portfolio: &Portfolio, weights: &[f64]) -> (f64, f64) {
    (
        expected_return(portfolio, weights),
        std_dev(portfolio, weights),
    )
}

/// Mean-variance utility `return - 0.5 γ variance`.
pub fn utility(portfolio: &Portfolio, weights: &[f64], risk_aversion: f64) -> f64 {
    expected_return(portfolio, weights) - 0.5 * risk_aversion * variance(portfolio, weights)
}

/// Gradient of the utility: `μ - γ Σ w`.
pub fn utility_gradient(portfolio: &Portfolio, weights: &[f64], risk_aversion: f64) -> DVector<f64> {
    let w = padded(portfolio, weights);
    portfolio.returns() - portfolio.covariance() * w * risk_aversion
}

/// Hessian of the utility: `-γ Σ`. Constant in the weights.
pub fn utility_hessian(portfolio: &Portfolio, risk_aversion: f64) -> DMatrix<f64> {
    portfolio.covariance() * -risk_aversion
}

/// Negated utility, the function the optimizer minimizes.
#[derive(Debug, Clone, Copy)]
pub struct UtilityObjective<'a> {
    portfolio: &'a Portfolio,
    risk_aversion: f64,
}

impl<'a> UtilityObjective<'a> {
    pub fn new(portfolio: &'a Portfolio, risk_aversion: f64) -> Self {
        UtilityObjective {
            portfolio,
            risk_aversion,
        }
    }
}

impl SmoothObjective for UtilityObjective<'_> {
    fn dim(&self) -> usize {
        self.portfolio.len()
    }

    fn value(&self, x: &DVector<f64>) -> f64 {
        -utility(self.portfolio, x.as_slice(), self.risk_aversion)
    }

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        -utility_gradient(self.portfolio, x.as_slice(), self.risk_aversion)
    }

    fn hessian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
        self.portfolio.covariance() * self.risk_aversion
    }
}
