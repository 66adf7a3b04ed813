//! Efficient frontier: one optimal allocation per risk aversion level.

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::model::Portfolio;
use crate::problem::Problem;
use crate::solver::{Settings, Solution};

/// An optimal allocation at a given risk aversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrontierPoint {
    pub risk_aversion: f64,
    pub solution: Solution,
}

/// Solve the allocation problem for every γ in `risk_aversions`.
///
/// Solves run in parallel; points come back in input order. The first
/// failing solve aborts the sweep.
pub fn efficient_frontier(
    portfolio: &Portfolio,
    risk_aversions: &[f64],
    settings: &Settings,
) -> Result<Vec<FrontierPoint>> {
    debug!(points = risk_aversions.len(), "solving efficient frontier");
    risk_aversions
        .par_iter()
        .map(|&gamma| -> Result<FrontierPoint> {
            let solution = Problem::maximize_utility(portfolio)
                .risk_aversion(gamma)
                .solve_with(settings.clone())?;
            Ok(FrontierPoint {
                risk_aversion: gamma,
                solution,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AllocError;
    use crate::model::{Asset, Bounds, CorrelationMatrix};

    fn three_assets() -> Portfolio {
        Portfolio::new(
            vec![
                Asset::risk_free(0.01).with_bounds((-0.5, 1.0)),
                Asset::new(0.08, 0.15).with_bounds(Bounds::at_least(0.0)),
                Asset::new(0.12, 0.30).with_bounds(Bounds::new(0.0, 0.5)),
            ],
            CorrelationMatrix::from_risky_pairs(2, &[0.3]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_points_in_input_order() {
        let gammas = [8.0, 1.0, 4.0, 2.0];
        let points = efficient_frontier(&three_assets(), &gammas, &Settings::default()).unwrap();
        let got: Vec<f64> = points.iter().map(|p| p.risk_aversion).collect();
        assert_eq!(got, gammas.to_vec());
    }

    #[test]
    fn test_risk_decreases_with_aversion() {
        let gammas = [1.0, 2.0, 4.0, 8.0, 16.0];
        let points = efficient_frontier(&three_assets(), &gammas, &Settings::default()).unwrap();
        for pair in points.windows(2) {
            assert!(
                pair[1].solution.std_dev <= pair[0].solution.std_dev + 1e-9,
                "std rose from {} to {} between gamma {} and {}",
                pair[0].solution.std_dev,
                pair[1].solution.std_dev,
                pair[0].risk_aversion,
                pair[1].risk_aversion
            );
        }
    }

    #[test]
    fn test_bad_gamma_aborts_sweep() {
        let err = efficient_frontier(&three_assets(), &[1.0, -2.0], &Settings::default())
            .unwrap_err();
        assert!(matches!(err, AllocError::InvalidModel(_)));
    }

    #[test]
    fn test_empty_grid() {
        let points = efficient_frontier(&three_assets(), &[], &Settings::default()).unwrap();
        assert!(points.is_empty());
    }
}
