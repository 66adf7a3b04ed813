//! Sequential quadratic programming for smooth objectives under box
//! constraints and the budget `Σ x = 1`.
//!
//! Each iteration:
//! 1. builds the QP model `½ dᵀ B d + gᵀ d` from the gradient and the
//!    (regularized) Hessian at `x`,
//! 2. solves it over `l - x ≤ d ≤ u - x`, `Σ d = 1 - Σ x` with the
//!    active-set method in [`super::qp`],
//! 3. backtracks on the ℓ1 merit `f(x) + ρ |Σ x - 1|` until the Armijo
//!    condition holds,
//! 4. stops once the step or the objective change is below tolerance.
//!
//! Both `x` and `x + d` lie in the box, so every trial point does too.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use super::projection::project_onto_budget_box;
use super::qp::BoxQp;
use super::settings::Settings;
use super::solution::SolveStatus;
use crate::error::{AllocError, Result};

/// A twice differentiable function to minimize.
pub trait SmoothObjective {
    /// Number of variables.
    fn dim(&self) -> usize;

    /// Function value at `x`.
    fn value(&self, x: &DVector<f64>) -> f64;

    /// Gradient at `x`.
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Hessian at `x`, or a positive semidefinite approximation of it.
    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64>;
}

/// Outcome of an SQP run.
#[derive(Debug, Clone)]
pub struct SqpReport {
    /// Last accepted iterate (the start when infeasible).
    pub x: DVector<f64>,
    /// Objective value at `x`.
    pub objective: f64,
    pub status: SolveStatus,
    /// QP subproblems solved.
    pub iterations: u32,
    /// `‖d‖∞` of the last search direction.
    pub step_norm: f64,
}

/// Minimize `objective` subject to `lower ≤ x ≤ upper` and `Σ x = 1`,
/// starting from the projection of `start` onto the feasible set.
pub fn minimize<F: SmoothObjective>(
    objective: &F,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    start: &DVector<f64>,
    settings: &Settings,
) -> Result<SqpReport> {
    let n = objective.dim();
    for v in [lower, upper, start] {
        if v.len() != n {
            return Err(AllocError::DimensionMismatch {
                expected: n,
                got: v.len(),
            });
        }
    }

    let mut x = match project_onto_budget_box(start.as_slice(), lower.as_slice(), upper.as_slice(), 1.0) {
        Some(x0) => DVector::from_vec(x0),
        None => {
            return Ok(SqpReport {
                x: start.clone(),
                objective: objective.value(start),
                status: SolveStatus::Infeasible,
                iterations: 0,
                step_norm: f64::INFINITY,
            })
        }
    };
    let mut f = finite(objective.value(&x), "objective at start")?;
    let mut rho: f64 = 1.0;
    let mut step_norm = f64::INFINITY;

    for iteration in 1..=settings.max_iter {
        let g = objective.gradient(&x);
        let mut b = objective.hessian(&x);
        for i in 0..n {
            b[(i, i)] += settings.hessian_regularization;
        }
        let qp_lower = lower - &x;
        let qp_upper = upper - &x;
        let violation = 1.0 - x.sum();

        let qp = BoxQp {
            hessian: &b,
            gradient: &g,
            lower: &qp_lower,
            upper: &qp_upper,
            budget: violation,
        };
        let sub = match qp.solve(settings.max_qp_iter) {
            Ok(sub) => sub,
            Err(AllocError::InfeasibleConstraints { .. }) => {
                return Ok(SqpReport {
                    objective: f,
                    x,
                    status: SolveStatus::Infeasible,
                    iterations: iteration,
                    step_norm,
                })
            }
            Err(e) => return Err(e),
        };
        let d = sub.step;
        step_norm = d.amax();

        if step_norm <= settings.step_tolerance {
            log_iteration(settings, iteration, f, step_norm, 0.0);
            return Ok(SqpReport {
                x,
                objective: f,
                status: SolveStatus::Converged,
                iterations: iteration,
                step_norm,
            });
        }

        rho = rho.max(sub.multiplier.abs() + 1.0);
        let merit = f + rho * violation.abs();
        let slope = (g.dot(&d) - rho * violation.abs()).min(0.0);
        let slack = f64::EPSILON * (1.0 + merit.abs());

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..settings.max_backtracks {
            let trial = clamp_to_box(&x + &d * alpha, lower, upper);
            let f_trial = objective.value(&trial);
            let merit_trial = f_trial + rho * (1.0 - trial.sum()).abs();
            if merit_trial <= merit + settings.armijo * alpha * slope + slack {
                accepted = Some((trial, f_trial));
                break;
            }
            alpha *= 0.5;
        }

        let Some((trial, f_trial)) = accepted else {
            debug!(iteration, objective = f, step_norm, "sqp line search failed");
            return Ok(SqpReport {
                x,
                objective: f,
                status: SolveStatus::LineSearchFailed,
                iterations: iteration,
                step_norm,
            });
        };

        let f_trial = finite(f_trial, "objective at trial point")?;
        let change = (f_trial - f).abs();
        x = trial;
        f = f_trial;
        log_iteration(settings, iteration, f, step_norm, alpha);

        let budget_error = (x.sum() - 1.0).abs();
        if change <= settings.tolerance && budget_error <= settings.feasibility_tolerance {
            return Ok(SqpReport {
                x,
                objective: f,
                status: SolveStatus::Converged,
                iterations: iteration,
                step_norm,
            });
        }
    }

    Ok(SqpReport {
        x,
        objective: f,
        status: SolveStatus::MaxIterations,
        iterations: settings.max_iter,
        step_norm,
    })
}

fn clamp_to_box(mut x: DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) -> DVector<f64> {
    for i in 0..x.len() {
        x[i] = x[i].max(lower[i]).min(upper[i]);
    }
    x
}

fn finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AllocError::NumericalError(format!("{} is {}", what, value)))
    }
}

fn log_iteration(settings: &Settings, iteration: u32, objective: f64, step_norm: f64, alpha: f64) {
    if settings.verbose {
        info!(iteration, objective, step_norm, alpha, "sqp iteration");
    } else {
        debug!(iteration, objective, step_norm, alpha, "sqp iteration");
    }
}
