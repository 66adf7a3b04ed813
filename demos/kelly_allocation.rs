//! Kelly Allocation Example
//!
//! Allocates capital across cash and four risky assets by maximizing
//!
//! maximize    μ'w - ½ γ w'Σw
//! subject to  sum(w) = 1
//!             l ≤ w ≤ u
//!
//! Cash may be borrowed up to 100% of capital; gold and bitcoin are capped.
//!
//! Run with `RUST_LOG=debug` to see the solver iterations.

use meanvar::prelude::*;

fn main() -> meanvar::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Kelly Allocation ===\n");

    let assets = vec![
        Asset::risk_free(0.005).named("Cash").with_bounds((-1.0, 1.0)),
        Asset::new(0.10, 0.16).named("SPY").with_bounds(Bounds::at_least(0.001)),
        Asset::new(0.04, 0.12).named("TLT").with_bounds(Bounds::at_least(0.001)),
        Asset::new(0.06, 0.18).named("GLD").with_bounds((0.001, 0.15)),
        Asset::new(0.15, 0.65).named("GBTC").with_bounds((0.001, 0.10)),
    ];

    // Risky pairs: SPY-TLT, SPY-GLD, SPY-GBTC, TLT-GLD, TLT-GBTC, GLD-GBTC
    let correlation = CorrelationMatrix::from_risky_pairs(4, &[-0.3, 0.4, 0.6, -0.1, -0.2, 0.3])?;
    let portfolio = Portfolio::new(assets, correlation)?;

    let risk_aversion = 3.0;
    println!("Risk aversion: {}\n", risk_aversion);

    let solution = Problem::maximize_utility(&portfolio)
        .risk_aversion(risk_aversion)
        .solve()?;

    println!("Optimal Allocation:");
    for (i, asset) in portfolio.assets().iter().enumerate() {
        println!("  {:<5} {:>8.2}%", asset.label(i), solution[i] * 100.0);
    }

    println!("\nPortfolio Statistics:");
    println!("  Expected return: {:.2}%", solution.expected_return * 100.0);
    println!("  Risk (std dev):  {:.2}%", solution.std_dev * 100.0);
    println!("  Utility:         {:.6}", solution.utility);
    println!("  SQP iterations:  {}", solution.iterations);

    let reference = solve_conic(&portfolio, risk_aversion, &ConicSettings::default())?;
    let gap = solution
        .weights
        .iter()
        .zip(&reference.weights)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    println!("\nMax weight gap vs. Clarabel: {:.2e}", gap);

    Ok(())
}
