//! Investable assets and their weight bounds.

use crate::error::{AllocError, Result};

/// Box constraint on a single portfolio weight.
///
/// `upper` may be `f64::INFINITY` and `lower` may be `f64::NEG_INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Smallest admissible weight.
    pub lower: f64,
    /// Largest admissible weight.
    pub upper: f64,
}

impl Bounds {
    /// Create bounds `[lower, upper]`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Bounds { lower, upper }
    }

    /// Bounds `[lower, +inf)`.
    pub fn at_least(lower: f64) -> Self {
        Bounds {
            lower,
            upper: f64::INFINITY,
        }
    }

    /// Check whether `weight` lies in the box, allowing `eps` of slack.
    pub fn contains(&self, weight: f64, eps: f64) -> bool {
        weight >= self.lower - eps && weight <= self.upper + eps
    }

    /// Clamp a weight into the box.
    pub fn clamp(&self, weight: f64) -> f64 {
        weight.max(self.lower).min(self.upper)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err("bounds must not be NaN".into());
        }
        if self.lower == f64::INFINITY {
            return Err("lower bound must not be +inf".into());
        }
        if self.upper == f64::NEG_INFINITY {
            return Err("upper bound must not be -inf".into());
        }
        if self.lower > self.upper {
            return Err(format!(
                "lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            ));
        }
        Ok(())
    }
}

impl Default for Bounds {
    /// Long-only, unlevered: `[0, 1]`.
    fn default() -> Self {
        Bounds {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((lower, upper): (f64, f64)) -> Self {
        Bounds { lower, upper }
    }
}

/// One investable instrument.
///
/// Returns and volatilities are annualized fractions (`0.10` is 10%).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Asset {
    /// Display name, if any.
    pub name: Option<String>,
    /// Expected annual return.
    pub expected_return: f64,
    /// Annual standard deviation of returns.
    pub volatility: f64,
    /// Weight bounds.
    pub bounds: Bounds,
}

impl Asset {
    /// Create an asset with default `[0, 1]` bounds.
    pub fn new(expected_return: f64, volatility: f64) -> Self {
        Asset {
            name: None,
            expected_return,
            volatility,
            bounds: Bounds::default(),
        }
    }

    /// Create the risk-free (cash) asset paying `rate`.
    pub fn risk_free(rate: f64) -> Self {
        Asset::new(rate, 0.0)
    }

    /// Attach a display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the weight bounds.
    pub fn with_bounds(mut self, bounds: impl Into<Bounds>) -> Self {
        self.bounds = bounds.into();
        self
    }

    /// Zero volatility marks the risk-free asset.
    pub fn is_risk_free(&self) -> bool {
        self.volatility == 0.0
    }

    /// Name for display: the asset name, or `asset <index>`.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("asset {}", index))
    }

    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        let label = self.label(index);
        if !self.expected_return.is_finite() {
            return Err(AllocError::InvalidModel(format!(
                "{}: expected return must be finite, got {}",
                label, self.expected_return
            )));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(AllocError::InvalidModel(format!(
                "{}: volatility must be finite and >= 0, got {}",
                label, self.volatility
            )));
        }
        self.bounds
            .validate()
            .map_err(|msg| AllocError::InvalidModel(format!("{}: {}", label, msg)))
    }
}
