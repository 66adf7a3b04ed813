//! Solver interface for meanvar.
//!
//! This module provides:
//! - The SQP loop and its active-set QP subproblem solver
//! - Projection onto the bounds-and-budget feasible set
//! - Settings and solution types
//! - A Clarabel backend for cross-checking

pub mod conic;
pub mod projection;
pub mod qp;
pub mod settings;
pub mod solution;
pub mod sqp;

pub use conic::{solve_conic, ConicSettings};
pub use projection::project_onto_budget_box;
pub use qp::{BoxQp, QpSolution};
pub use settings::Settings;
pub use solution::{Solution, SolveStatus};
pub use sqp::{minimize, SmoothObjective, SqpReport};
