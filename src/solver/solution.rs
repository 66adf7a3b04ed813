//! Solver results.

use crate::model::Portfolio;
use crate::stats;

/// Termination status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// Tolerances met.
    Converged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// No step along the search direction decreased the merit function.
    LineSearchFailed,
    /// No point satisfies both the bounds and the budget.
    Infeasible,
}

impl SolveStatus {
    pub fn is_converged(self) -> bool {
        matches!(self, SolveStatus::Converged)
    }
}

/// An allocation together with its statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Termination status.
    pub status: SolveStatus,
    /// One weight per asset, in portfolio order.
    pub weights: Vec<f64>,
    /// Expected portfolio return.
    pub expected_return: f64,
    /// Portfolio standard deviation.
    pub std_dev: f64,
    /// Mean-variance utility at `weights`.
    pub utility: f64,
    /// Number of solver iterations.
    pub iterations: u32,
    /// Size `‖d‖∞` of the last search direction.
    pub step_norm: f64,
}

impl Solution {
    /// Evaluate the statistics of `weights` and wrap them.
    pub fn evaluate(
        portfolio: &Portfolio,
        risk_aversion: f64,
        weights: Vec<f64>,
        status: SolveStatus,
        iterations: u32,
        step_norm: f64,
    ) -> Self {
        let (expected_return, std_dev) = stats::mean_and_std(portfolio, &weights);
        let utility = stats::utility(portfolio, &weights, risk_aversion);
        Solution {
            status,
            weights,
            expected_return,
            std_dev,
            utility,
            iterations,
            step_norm,
        }
    }

    /// Weight of asset `index`.
    pub fn weight(&self, index: usize) -> Option<f64> {
        self.weights.get(index).copied()
    }

    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }

    /// `Σ w - 1`.
    pub fn budget_residual(&self) -> f64 {
        self.weights.iter().sum::<f64>() - 1.0
    }

    /// All reported numbers are finite.
    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite())
            && self.expected_return.is_finite()
            && self.std_dev.is_finite()
            && self.utility.is_finite()
    }
}

impl std::ops::Index<usize> for Solution {
    type Output = f64;

    /// Weight of asset `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. Use `weight()` to get an `Option`.
    fn index(&self, index: usize) -> &f64 {
        &self.weights[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Asset, CorrelationMatrix};

    #[test]
    fn test_evaluate_fills_statistics() {
        let p = Portfolio::new(
            vec![Asset::risk_free(0.01), Asset::new(0.09, 0.2)],
            CorrelationMatrix::identity(2),
        )
        .unwrap();
        let s = Solution::evaluate(&p, 2.0, vec![0.5, 0.5], SolveStatus::Converged, 3, 0.0);
        assert!((s.expected_return - 0.05).abs() < 1e-15);
        assert!((s.std_dev - 0.1).abs() < 1e-15);
        assert!((s.utility - (0.05 - 0.01)).abs() < 1e-15);
        assert!((s.variance() - 0.01).abs() < 1e-15);
        assert_eq!(s.budget_residual(), 0.0);
        assert_eq!(s[1], 0.5);
        assert_eq!(s.weight(2), None);
        assert!(s.is_finite());
        assert!(s.status.is_converged());
    }
}
