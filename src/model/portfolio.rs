//! A validated set of assets with their correlation structure.

use nalgebra::{DMatrix, DVector};

use super::asset::Asset;
use super::correlation::CorrelationMatrix;
use crate::error::{AllocError, Result};

/// Slack allowed when comparing bound sums against the unit budget.
const BUDGET_TOL: f64 = 1e-12;

/// Ordered assets plus their correlation matrix.
///
/// Construction validates every asset, forces the correlation of each
/// zero-volatility asset with everything else to 0, and precomputes the
/// covariance `Σ = D C D` with `D = diag(volatility)`.
#[derive(Debug, Clone)]
pub struct Portfolio {
    assets: Vec<Asset>,
    correlation: CorrelationMatrix,
    returns: DVector<f64>,
    volatilities: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl Portfolio {
    /// Validate and assemble a portfolio.
    pub fn new(assets: Vec<Asset>, mut correlation: CorrelationMatrix) -> Result<Self> {
        if assets.is_empty() {
            return Err(AllocError::InvalidModel("portfolio has no assets".into()));
        }
        if correlation.dim() != assets.len() {
            return Err(AllocError::DimensionMismatch {
                expected: assets.len(),
                got: correlation.dim(),
            });
        }
        for (i, asset) in assets.iter().enumerate() {
            asset.validate(i)?;
            if asset.is_risk_free() {
                correlation.decouple(i);
            }
        }

        let returns = DVector::from_iterator(assets.len(), assets.iter().map(|a| a.expected_return));
        let volatilities = DVector::from_iterator(assets.len(), assets.iter().map(|a| a.volatility));
        let d = DMatrix::from_diagonal(&volatilities);
        let covariance = &d * correlation.as_matrix() * &d;

        Ok(Portfolio {
            assets,
            correlation,
            returns,
            volatilities,
            covariance,
        })
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Always false for a constructed portfolio.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, index: usize) -> Option<&Asset> {
        self.assets.get(index)
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Expected returns, one per asset.
    pub fn returns(&self) -> &DVector<f64> {
        &self.returns
    }

    pub fn volatilities(&self) -> &DVector<f64> {
        &self.volatilities
    }

    /// Covariance matrix `D C D`.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn lower_bounds(&self) -> DVector<f64> {
        DVector::from_iterator(self.len(), self.assets.iter().map(|a| a.bounds.lower))
    }

    pub fn upper_bounds(&self) -> DVector<f64> {
        DVector::from_iterator(self.len(), self.assets.iter().map(|a| a.bounds.upper))
    }

    /// Index of the first zero-volatility asset.
    pub fn risk_free_index(&self) -> Option<usize> {
        self.assets.iter().position(Asset::is_risk_free)
    }

    /// Sums of the lower and of the upper bounds.
    pub fn bound_sums(&self) -> (f64, f64) {
        self.assets.iter().fold((0.0, 0.0), |(lo, hi), a| {
            (lo + a.bounds.lower, hi + a.bounds.upper)
        })
    }

    /// Check that some weight vector satisfies both the bounds and the
    /// budget `Σ w = 1`.
    pub fn check_feasible(&self) -> Result<()> {
        let (lower_sum, upper_sum) = self.bound_sums();
        if lower_sum > 1.0 + BUDGET_TOL || upper_sum < 1.0 - BUDGET_TOL {
            return Err(AllocError::InfeasibleConstraints {
                lower_sum,
                upper_sum,
            });
        }
        Ok(())
    }

    /// Check that `weights` has one entry per asset, each within its bounds
    /// up to `eps`, and sums to one up to `eps`.
    pub fn is_admissible(&self, weights: &[f64], eps: f64) -> bool {
        weights.len() == self.len()
            && (weights.iter().sum::<f64>() - 1.0).abs() <= eps
            && self
                .assets
                .iter()
                .zip(weights)
                .all(|(a, &w)| a.bounds.contains(w, eps))
    }
}
