//! # meanvar
//!
//! Mean-variance capital allocation.
//!
//! Given expected returns, volatilities and a correlation matrix for a set
//! of assets (typically one risk-free asset plus several risky ones),
//! meanvar finds the weights that maximize the mean-variance utility
//!
//! ```text
//! U(w) = μᵀw - ½ γ wᵀΣw,    Σ = D C D,  D = diag(σ)
//! ```
//!
//! subject to the budget `Σ w = 1` and per-asset bounds `l ≤ w ≤ u`.
//! Maximizing `U` is the quadratic approximation of maximizing expected
//! log wealth (the Kelly criterion) when `γ = 1`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use meanvar::prelude::*;
//!
//! # fn main() -> meanvar::Result<()> {
//! let assets = vec![
//!     Asset::risk_free(0.005).named("Cash").with_bounds((-1.0, 1.0)),
//!     Asset::new(0.10, 0.16).named("SPY").with_bounds(Bounds::at_least(0.001)),
//!     Asset::new(0.04, 0.12).named("TLT").with_bounds(Bounds::at_least(0.001)),
//! ];
//! let correlation = CorrelationMatrix::from_risky_pairs(2, &[-0.3])?;
//! let portfolio = Portfolio::new(assets, correlation)?;
//!
//! let solution = Problem::maximize_utility(&portfolio)
//!     .risk_aversion(3.0)
//!     .solve()?;
//!
//! println!("weights: {:?}", solution.weights);
//! println!("return {:.4}, std {:.4}", solution.expected_return, solution.std_dev);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Model**: `Asset`, `CorrelationMatrix` (validated, PSD-checked) and
//!   `Portfolio`, which precomputes the covariance matrix
//! - **Statistics**: pure functions for return, variance, utility and its
//!   analytic derivatives
//! - **SQP solver**: active-set QP subproblems, ℓ1 merit line search,
//!   explicit convergence status
//! - **Clarabel backend**: the same problem solved by an interior-point
//!   method, for cross-checking
//! - **Frontier**: parallel sweep over risk aversion levels

pub mod error;
pub mod frontier;
pub mod model;
pub mod problem;
pub mod solver;
pub mod stats;

/// Prelude module for convenient imports.
///
/// ```
/// use meanvar::prelude::*;
/// ```
pub mod prelude {
    // Model
    pub use crate::model::{Asset, Bounds, CorrelationMatrix, Portfolio};

    // Statistics
    pub use crate::stats::{expected_return, mean_and_std, std_dev, utility, variance};

    // Problem
    pub use crate::problem::{Problem, ProblemBuilder};

    // Solver
    pub use crate::solver::{solve_conic, ConicSettings, Settings, Solution, SolveStatus};

    // Frontier
    pub use crate::frontier::{efficient_frontier, FrontierPoint};

    // Errors
    pub use crate::error::{AllocError, Result};
}

// Re-export main types at crate root
pub use error::{AllocError, Result};
pub use model::{Asset, Bounds, CorrelationMatrix, Portfolio};
pub use problem::Problem;
pub use solver::{Settings, Solution, SolveStatus};
