//! Primal active-set solver for the SQP subproblem
//!
//! ```text
//! minimize    ½ dᵀ B d + gᵀ d
//! subject to  Σ d = r
//!             l ≤ d ≤ u
//! ```
//!
//! with `B` symmetric positive definite on the null space of the budget row.
//! Bounds may be infinite.
//!
//! Each iteration eliminates the budget row over the free variables: one
//! free variable (the pivot) absorbs `-Σ` of the others, which turns the
//! equality-constrained step into a small unconstrained positive definite
//! system solved by Cholesky.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use super::projection::project_onto_budget_box;
use crate::error::{AllocError, Result};

/// Steps below this (relative to `1 + ‖d‖∞`) count as zero.
const ZERO_STEP: f64 = 1e-13;

/// Multiplier slack before a bound is released.
const MULTIPLIER_TOL: f64 = 1e-12;

/// A QP subproblem. Borrowed views, nothing is copied.
#[derive(Debug, Clone, Copy)]
pub struct BoxQp<'a> {
    /// Quadratic term `B`.
    pub hessian: &'a DMatrix<f64>,
    /// Linear term `g`.
    pub gradient: &'a DVector<f64>,
    /// Lower bounds `l`.
    pub lower: &'a DVector<f64>,
    /// Upper bounds `u`.
    pub upper: &'a DVector<f64>,
    /// Right-hand side `r` of the budget row.
    pub budget: f64,
}

/// Which side of its box a variable is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

/// Result of a QP solve.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Minimizer `d`.
    pub step: DVector<f64>,
    /// Multiplier of the budget row.
    pub multiplier: f64,
    /// Active-set iterations used.
    pub iterations: u32,
}

impl BoxQp<'_> {
    fn dim(&self) -> usize {
        self.gradient.len()
    }

    /// Solve with at most `max_iter` active-set iterations.
    ///
    /// Returns `InfeasibleConstraints` when the box misses the budget
    /// hyperplane.
    pub fn solve(&self, max_iter: u32) -> Result<QpSolution> {
        let n = self.dim();
        if self.hessian.nrows() != n || self.hessian.ncols() != n {
            return Err(AllocError::DimensionMismatch {
                expected: n,
                got: self.hessian.nrows(),
            });
        }

        let start = project_onto_budget_box(
            &vec![0.0; n],
            self.lower.as_slice(),
            self.upper.as_slice(),
            self.budget,
        )
        .ok_or_else(|| AllocError::InfeasibleConstraints {
            lower_sum: self.lower.sum(),
            upper_sum: self.upper.sum(),
        })?;
        let mut d = DVector::from_vec(start);
        let mut working: Vec<Option<Side>> = vec![None; n];

        for iteration in 1..=max_iter {
            let grad = self.hessian * &d + self.gradient;
            let free: Vec<usize> = (0..n).filter(|&i| working[i].is_none()).collect();
            let (p, multiplier) = self.equality_step(&grad, &free)?;

            if p.amax() <= ZERO_STEP * (1.0 + d.amax()) {
                match self.most_violated(&grad, multiplier, &working) {
                    None => {
                        trace!(iteration, multiplier, "qp optimal");
                        return Ok(QpSolution {
                            step: d,
                            multiplier,
                            iterations: iteration,
                        });
                    }
                    Some(i) => {
                        trace!(iteration, released = i, "qp releases bound");
                        working[i] = None;
                        continue;
                    }
                }
            }

            // Ratio test against the bounds of the free variables.
            let mut alpha = 1.0;
            let mut blocking = None;
            for (k, &i) in free.iter().enumerate() {
                let (limit, side) = if p[k] < 0.0 {
                    (self.lower[i], Side::Lower)
                } else if p[k] > 0.0 {
                    (self.upper[i], Side::Upper)
                } else {
                    continue;
                };
                if !limit.is_finite() {
                    continue;
                }
                let ratio = ((limit - d[i]) / p[k]).max(0.0);
                if ratio < alpha {
                    alpha = ratio;
                    blocking = Some((i, side));
                }
            }

            for (k, &i) in free.iter().enumerate() {
                d[i] += alpha * p[k];
            }
            if let Some((i, side)) = blocking {
                d[i] = match side {
                    Side::Lower => self.lower[i],
                    Side::Upper => self.upper[i],
                };
                working[i] = Some(side);
                trace!(iteration, blocked = i, alpha, "qp adds bound");
            }
        }

        Err(AllocError::NumericalError(format!(
            "QP active set did not settle in {} iterations",
            max_iter
        )))
    }

    /// Minimize the model over the free variables with the budget row held
    /// fixed. Returns the step on the free block and the budget multiplier.
    fn equality_step(&self, grad: &DVector<f64>, free: &[usize]) -> Result<(DVector<f64>, f64)> {
        let m = free.len();
        if m == 0 {
            return Err(AllocError::NumericalError(
                "QP working set covers every variable".into(),
            ));
        }

        // p_free = Z y with Z = [-1ᵀ; I]: the first free variable pivots.
        let pivot = free[0];
        let rest = &free[1..];
        let mut y = DVector::zeros(m - 1);
        if m > 1 {
            let reduced_hessian = DMatrix::from_fn(m - 1, m - 1, |a, b| {
                let (i, j) = (rest[a], rest[b]);
                self.hessian[(i, j)] - self.hessian[(i, pivot)] - self.hessian[(pivot, j)]
                    + self.hessian[(pivot, pivot)]
            });
            let reduced_gradient = DVector::from_fn(m - 1, |a, _| grad[rest[a]] - grad[pivot]);
            let chol = reduced_hessian.cholesky().ok_or_else(|| {
                AllocError::NumericalError(
                    "QP reduced Hessian is not positive definite".into(),
                )
            })?;
            y = -chol.solve(&reduced_gradient);
        }

        let mut p = DVector::zeros(m);
        p[0] = -y.sum();
        for a in 0..(m - 1) {
            p[a + 1] = y[a];
        }

        // Stationarity on the pivot row: (grad + B p)_pivot + λ = 0.
        let bp_pivot: f64 = free
            .iter()
            .zip(p.iter())
            .map(|(&j, &pj)| self.hessian[(pivot, j)] * pj)
            .sum();
        let multiplier = -(grad[pivot] + bp_pivot);
        Ok((p, multiplier))
    }

    /// Working-set bound whose multiplier has the wrong sign, worst first.
    fn most_violated(
        &self,
        grad: &DVector<f64>,
        multiplier: f64,
        working: &[Option<Side>],
    ) -> Option<usize> {
        let tol = MULTIPLIER_TOL * (1.0 + grad.amax());
        let mut worst: Option<(usize, f64)> = None;
        for (i, side) in working.iter().enumerate() {
            let r = grad[i] + multiplier;
            let violation = match side {
                Some(Side::Lower) => -r,
                Some(Side::Upper) => r,
                None => continue,
            };
            if violation > tol && worst.map_or(true, |(_, v)| violation > v) {
                worst = Some((i, violation));
            }
        }
        worst.map(|(i, _)| i)
    }
}
