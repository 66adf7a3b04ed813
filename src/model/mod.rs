//! Market model: assets, correlation structure and the portfolio that ties
//! them together.
//!
//! All types here are immutable once constructed and validated, so a
//! [`Portfolio`] can be shared freely between concurrent solves.

pub mod asset;
pub mod correlation;
pub mod portfolio;

pub use asset::{Asset, Bounds};
pub use correlation::CorrelationMatrix;
pub use portfolio::Portfolio;
