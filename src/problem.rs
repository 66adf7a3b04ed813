//! Problem definition and solving API.
//!
//! A `Problem` pairs a validated [`Portfolio`] with a risk aversion
//! coefficient and optionally a starting allocation:
//!
//! ```no_run
//! use meanvar::prelude::*;
//!
//! # fn main() -> meanvar::Result<()> {
//! let portfolio = Portfolio::new(
//!     vec![
//!         Asset::risk_free(0.005).with_bounds((-1.0, 1.0)),
//!         Asset::new(0.10, 0.16),
//!     ],
//!     CorrelationMatrix::identity(2),
//! )?;
//! let solution = Problem::maximize_utility(&portfolio)
//!     .risk_aversion(3.0)
//!     .solve()?;
//! println!("risky weight: {}", solution[1]);
//! # Ok(())
//! # }
//! ```

use nalgebra::DVector;
use tracing::{debug, warn};

use crate::error::{AllocError, Result};
use crate::model::Portfolio;
use crate::solver::{minimize, Settings, Solution, SolveStatus};
use crate::stats::UtilityObjective;

/// Risk aversion used when the builder is not given one.
pub const DEFAULT_RISK_AVERSION: f64 = 3.0;

/// Utility maximization over a portfolio.
#[derive(Debug, Clone)]
pub struct Problem<'a> {
    /// The market model.
    pub portfolio: &'a Portfolio,
    /// Risk aversion coefficient γ.
    pub risk_aversion: f64,
    /// Starting allocation; equal weights when `None`.
    pub start: Option<Vec<f64>>,
}

impl<'a> Problem<'a> {
    /// Maximize `E[r] - ½ γ Var[r]` over `portfolio`.
    pub fn maximize_utility(portfolio: &'a Portfolio) -> ProblemBuilder<'a> {
        ProblemBuilder {
            portfolio,
            risk_aversion: DEFAULT_RISK_AVERSION,
            start: None,
        }
    }

    /// Solve with default settings.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(Settings::default())
    }

    /// Solve with custom settings.
    ///
    /// Only a converged solve is `Ok`. An exhausted iteration budget or a
    /// failed line search is a `ConvergenceFailure` carrying the best
    /// iterate.
    pub fn solve_with(&self, settings: Settings) -> Result<Solution> {
        settings.validate()?;
        if !self.risk_aversion.is_finite() || self.risk_aversion <= 0.0 {
            return Err(AllocError::InvalidModel(format!(
                "risk aversion must be finite and positive, got {}",
                self.risk_aversion
            )));
        }
        self.portfolio.check_feasible()?;

        let n = self.portfolio.len();
        let start = match &self.start {
            Some(w) => {
                if w.len() != n {
                    return Err(AllocError::DimensionMismatch {
                        expected: n,
                        got: w.len(),
                    });
                }
                if w.iter().any(|v| !v.is_finite()) {
                    return Err(AllocError::InvalidSettings(
                        "starting weights must be finite".into(),
                    ));
                }
                DVector::from_column_slice(w)
            }
            None => DVector::from_element(n, 1.0 / n as f64),
        };

        let objective = UtilityObjective::new(self.portfolio, self.risk_aversion);
        let report = minimize(
            &objective,
            &self.portfolio.lower_bounds(),
            &self.portfolio.upper_bounds(),
            &start,
            &settings,
        )?;

        let solution = Solution::evaluate(
            self.portfolio,
            self.risk_aversion,
            report.x.as_slice().to_vec(),
            report.status,
            report.iterations,
            report.step_norm,
        );
        if !solution.is_finite() {
            return Err(AllocError::NumericalError(
                "solution contains non-finite values".into(),
            ));
        }

        match solution.status {
            SolveStatus::Converged => {
                debug!(
                    iterations = solution.iterations,
                    utility = solution.utility,
                    "allocation converged"
                );
                Ok(solution)
            }
            SolveStatus::Infeasible => {
                let (lower_sum, upper_sum) = self.portfolio.bound_sums();
                Err(AllocError::InfeasibleConstraints {
                    lower_sum,
                    upper_sum,
                })
            }
            status @ (SolveStatus::MaxIterations | SolveStatus::LineSearchFailed) => {
                warn!(
                    ?status,
                    iterations = solution.iterations,
                    step_norm = solution.step_norm,
                    "allocation did not converge"
                );
                Err(AllocError::ConvergenceFailure {
                    status,
                    iterations: solution.iterations,
                    best: Box::new(solution),
                })
            }
        }
    }
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder<'a> {
    portfolio: &'a Portfolio,
    risk_aversion: f64,
    start: Option<Vec<f64>>,
}

impl<'a> ProblemBuilder<'a> {
    /// Set the risk aversion coefficient γ.
    pub fn risk_aversion(mut self, gamma: f64) -> Self {
        self.risk_aversion = gamma;
        self
    }

    /// Start the solver from `weights` (projected onto the feasible set).
    pub fn starting_from(mut self, weights: impl Into<Vec<f64>>) -> Self {
        self.start = Some(weights.into());
        self
    }

    /// Build the problem.
    pub fn build(self) -> Problem<'a> {
        Problem {
            portfolio: self.portfolio,
            risk_aversion: self.risk_aversion,
            start: self.start,
        }
    }

    /// Build and solve the problem with default settings.
    pub fn solve(self) -> Result<Solution> {
        self.build().solve()
    }

    /// Build and solve the problem with custom settings.
    pub fn solve_with(self, settings: Settings) -> Result<Solution> {
        self.build().solve_with(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Asset, Bounds, CorrelationMatrix};
    use tracing_test::traced_test;

    fn cash_and_stock() -> Portfolio {
        Portfolio::new(
            vec![
                Asset::risk_free(0.005).with_bounds((-1.0, 1.0)),
                Asset::new(0.10, 0.16).with_bounds(Bounds::at_least(0.001)),
            ],
            CorrelationMatrix::identity(2),
        )
        .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let portfolio = cash_and_stock();
        let problem = Problem::maximize_utility(&portfolio).build();
        assert_eq!(problem.risk_aversion, DEFAULT_RISK_AVERSION);
        assert!(problem.start.is_none());
    }

    #[test]
    fn test_two_asset_interior_solution() {
        let portfolio = cash_and_stock();
        let solution = Problem::maximize_utility(&portfolio)
            .risk_aversion(3.0)
            .solve()
            .unwrap();
        let expected = (0.10 - 0.005) / (3.0 * 0.16 * 0.16);
        assert_eq!(solution.status, SolveStatus::Converged);
        assert!((solution[1] - expected).abs() < 1e-8, "got {}", solution[1]);
        assert!((solution[0] + solution[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_leverage_capped_by_cash_bound() {
        let portfolio = cash_and_stock();
        let solution = Problem::maximize_utility(&portfolio)
            .risk_aversion(1.0)
            .solve()
            .unwrap();
        assert!((solution[0] + 1.0).abs() < 1e-9, "cash {}", solution[0]);
        assert!((solution[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_risk_aversion() {
        let portfolio = cash_and_stock();
        for gamma in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Problem::maximize_utility(&portfolio)
                .risk_aversion(gamma)
                .solve()
                .unwrap_err();
            assert!(matches!(err, AllocError::InvalidModel(_)), "gamma {}", gamma);
        }
    }

    #[test]
    fn test_start_length_checked() {
        let portfolio = cash_and_stock();
        let err = Problem::maximize_utility(&portfolio)
            .starting_from(vec![1.0])
            .solve()
            .unwrap_err();
        assert!(matches!(
            err,
            AllocError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_non_finite_start_rejected() {
        let portfolio = cash_and_stock();
        let err = Problem::maximize_utility(&portfolio)
            .starting_from(vec![f64::NAN, 1.0])
            .solve()
            .unwrap_err();
        assert!(matches!(err, AllocError::InvalidSettings(_)));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let portfolio = cash_and_stock();
        let settings = Settings {
            max_iter: 0,
            ..Settings::default()
        };
        let err = Problem::maximize_utility(&portfolio)
            .solve_with(settings)
            .unwrap_err();
        assert!(matches!(err, AllocError::InvalidSettings(_)));
    }

    #[test]
    fn test_infeasible_bounds() {
        let portfolio = Portfolio::new(
            vec![
                Asset::new(0.05, 0.1).with_bounds((0.8, 1.0)),
                Asset::new(0.07, 0.2).with_bounds((0.7, 1.0)),
            ],
            CorrelationMatrix::identity(2),
        )
        .unwrap();
        let err = Problem::maximize_utility(&portfolio).solve().unwrap_err();
        match err {
            AllocError::InfeasibleConstraints { lower_sum, .. } => {
                assert!((lower_sum - 1.5).abs() < 1e-12);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    #[traced_test]
    fn test_non_convergence_is_logged() {
        let portfolio = cash_and_stock();
        let settings = Settings {
            max_iter: 1,
            ..Settings::default()
        };
        let err = Problem::maximize_utility(&portfolio)
            .solve_with(settings)
            .unwrap_err();
        assert!(matches!(err, AllocError::ConvergenceFailure { .. }));
        assert!(logs_contain("sqp iteration"));
        assert!(logs_contain("allocation did not converge"));
    }
}
