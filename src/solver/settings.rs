//! Solver settings.

use crate::error::{AllocError, Result};

/// Settings for the SQP solver.
///
/// Every solve takes its settings explicitly; there is no global
/// configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Log every iteration at `info` instead of `debug`.
    pub verbose: bool,
    /// Maximum SQP iterations.
    pub max_iter: u32,
    /// Stop once an accepted step changes the objective by at most this much
    /// (and the budget is met).
    pub tolerance: f64,
    /// Maximum budget violation `|Σ w - 1|` accepted at convergence.
    pub feasibility_tolerance: f64,
    /// Stop once the QP step `‖d‖∞` is at most this.
    pub step_tolerance: f64,
    /// Added to the Hessian diagonal of each QP subproblem.
    pub hessian_regularization: f64,
    /// Armijo sufficient-decrease constant.
    pub armijo: f64,
    /// Step halvings tried before the line search gives up.
    pub max_backtracks: u32,
    /// Active-set iterations allowed per QP subproblem.
    pub max_qp_iter: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 100,
            tolerance: 1e-12,
            feasibility_tolerance: 1e-9,
            step_tolerance: 1e-12,
            hessian_regularization: 1e-10,
            armijo: 1e-4,
            max_backtracks: 40,
            max_qp_iter: 200,
        }
    }
}

impl Settings {
    /// Check that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(AllocError::InvalidSettings("max_iter must be positive".into()));
        }
        if self.max_qp_iter == 0 {
            return Err(AllocError::InvalidSettings(
                "max_qp_iter must be positive".into(),
            ));
        }
        let non_negative = [
            ("tolerance", self.tolerance),
            ("feasibility_tolerance", self.feasibility_tolerance),
            ("step_tolerance", self.step_tolerance),
            ("hessian_regularization", self.hessian_regularization),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) || value.is_infinite() {
                return Err(AllocError::InvalidSettings(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        if !(self.armijo > 0.0 && self.armijo < 1.0) {
            return Err(AllocError::InvalidSettings(format!(
                "armijo must lie in (0, 1), got {}",
                self.armijo
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.verbose);
        assert_eq!(settings.max_iter, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            Settings {
                max_iter: 0,
                ..Settings::default()
            },
            Settings {
                tolerance: f64::NAN,
                ..Settings::default()
            },
            Settings {
                step_tolerance: -1.0,
                ..Settings::default()
            },
            Settings {
                armijo: 1.0,
                ..Settings::default()
            },
            Settings {
                max_qp_iter: 0,
                ..Settings::default()
            },
        ];
        for settings in cases {
            assert!(
                matches!(settings.validate(), Err(AllocError::InvalidSettings(_))),
                "accepted {:?}",
                settings
            );
        }
    }

    #[test]
    fn test_accepts_tight_tolerance() {
        let settings = Settings {
            tolerance: 1e-20,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
