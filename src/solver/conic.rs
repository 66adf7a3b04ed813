//! Clarabel backend.
//!
//! Solves the same allocation problem with the Clarabel interior-point
//! solver instead of SQP. The problem is stuffed into Clarabel's form
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  A x + s = b,  s ∈ K
//! ```
//!
//! with `P = γ Σ`, `q = -μ`, one zero-cone row for the budget and one
//! nonnegative-cone row per finite bound.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use nalgebra_sparse::{CooMatrix, CscMatrix};
use tracing::debug;

use super::solution::{Solution, SolveStatus};
use crate::error::{AllocError, Result};
use crate::model::Portfolio;

/// Settings for the Clarabel backend.
#[derive(Debug, Clone)]
pub struct ConicSettings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute tolerance.
    pub tol_gap_abs: f64,
    /// Relative tolerance.
    pub tol_gap_rel: f64,
}

impl Default for ConicSettings {
    fn default() -> Self {
        ConicSettings {
            verbose: false,
            max_iter: 100,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-10,
            tol_gap_rel: 1e-10,
        }
    }
}

/// Map a Clarabel status onto ours. `None` for statuses with no
/// counterpart (numerical trouble, dual infeasibility).
fn map_status(status: SolverStatus) -> Option<SolveStatus> {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => Some(SolveStatus::Converged),
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            Some(SolveStatus::Infeasible)
        }
        SolverStatus::MaxIterations | SolverStatus::MaxTime => Some(SolveStatus::MaxIterations),
        _ => None,
    }
}

/// Allocation problem in Clarabel's matrix form.
#[derive(Debug)]
struct StuffedProblem {
    /// Upper triangle of `γ Σ`.
    p: CscMatrix<f64>,
    q: Vec<f64>,
    a: CscMatrix<f64>,
    b: Vec<f64>,
    /// Rows in the nonnegative cone (after the single budget row).
    nonneg: usize,
}

fn stuff_problem(portfolio: &Portfolio, risk_aversion: f64) -> StuffedProblem {
    let n = portfolio.len();
    let cov = portfolio.covariance();

    let mut p = CooMatrix::new(n, n);
    for j in 0..n {
        for i in 0..=j {
            let v = risk_aversion * cov[(i, j)];
            if v != 0.0 {
                p.push(i, j, v);
            }
        }
    }
    let q: Vec<f64> = portfolio.returns().iter().map(|r| -r).collect();

    // Row 0: Σ x = 1. Then -x_i + s = -l_i and x_i + s = u_i.
    let mut rows = Vec::new();
    let mut b = vec![1.0];
    for i in 0..n {
        rows.push((0, i, 1.0));
    }
    let mut row = 1;
    for (i, asset) in portfolio.assets().iter().enumerate() {
        if asset.bounds.lower.is_finite() {
            rows.push((row, i, -1.0));
            b.push(-asset.bounds.lower);
            row += 1;
        }
        if asset.bounds.upper.is_finite() {
            rows.push((row, i, 1.0));
            b.push(asset.bounds.upper);
            row += 1;
        }
    }
    let mut a = CooMatrix::new(row, n);
    for (r, c, v) in rows {
        a.push(r, c, v);
    }

    StuffedProblem {
        p: CscMatrix::from(&p),
        q,
        a: CscMatrix::from(&a),
        b,
        nonneg: row - 1,
    }
}

/// Solve the allocation problem with Clarabel.
///
/// The model is assumed validated (see [`Portfolio::new`]); `risk_aversion`
/// must be positive. The returned status is `Converged`, `MaxIterations` or
/// `Infeasible`; any other Clarabel outcome is an `AllocError::Solver`.
pub fn solve_conic(
    portfolio: &Portfolio,
    risk_aversion: f64,
    settings: &ConicSettings,
) -> Result<Solution> {
    let stuffed = stuff_problem(portfolio, risk_aversion);
    let p = to_clarabel_csc(&stuffed.p);
    let a = to_clarabel_csc(&stuffed.a);
    let mut cones = vec![SupportedConeT::ZeroConeT(1)];
    if stuffed.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(stuffed.nonneg));
    }

    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .build()
        .map_err(|e| AllocError::Solver(e.to_string()))?;

    let mut solver = DefaultSolver::new(&p, &stuffed.q, &a, &stuffed.b, &cones, clarabel_settings);
    solver.solve();

    let status = map_status(solver.solution.status).ok_or_else(|| {
        AllocError::Solver(format!("Clarabel stopped with {:?}", solver.solution.status))
    })?;
    let iterations = solver.info.iterations;
    debug!(?status, iterations, "clarabel finished");

    Ok(Solution::evaluate(
        portfolio,
        risk_aversion,
        solver.solution.x.clone(),
        status,
        iterations,
        0.0,
    ))
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}
