//! Error types for meanvar.

use thiserror::Error;

use crate::solver::{Solution, SolveStatus};

/// Error type for meanvar operations.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Market parameters or bounds violate the model invariants.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// No weight vector satisfies both the box bounds and the budget.
    #[error(
        "Infeasible constraints: lower bounds sum to {lower_sum}, upper bounds sum to {upper_sum}, budget is 1"
    )]
    InfeasibleConstraints { lower_sum: f64, upper_sum: f64 },

    /// The solver stopped before meeting its tolerance.
    ///
    /// Carries the best iterate found so far.
    #[error("Solver did not converge ({status:?}) after {iterations} iterations")]
    ConvergenceFailure {
        status: SolveStatus,
        iterations: u32,
        best: Box<Solution>,
    },

    /// Shape mismatch.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Solver settings out of range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Numerical error.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Error reported by the conic backend.
    #[error("Solver error: {0}")]
    Solver(String),
}

/// Result type for meanvar operations.
pub type Result<T> = std::result::Result<T, AllocError>;
