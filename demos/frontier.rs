//! Efficient Frontier Example
//!
//! Sweeps the risk aversion coefficient γ over a grid and prints the
//! optimal return/risk trade-off for a long-only four-asset universe with
//! a borrowable risk-free asset.

use meanvar::prelude::*;

fn main() -> meanvar::Result<()> {
    println!("=== Efficient Frontier ===\n");

    // Risk-free plus 4 assets with different risk/return profiles
    let assets = vec![
        Asset::risk_free(0.02).named("RF").with_bounds((-0.5, 1.0)),
        Asset::new(0.12, 0.20).named("A"),
        Asset::new(0.10, 0.17).named("B"),
        Asset::new(0.07, 0.14).named("C"),
        Asset::new(0.05, 0.10).named("D"),
    ];

    #[rustfmt::skip]
    let correlation = CorrelationMatrix::from_rows(&[
        &[1.0, 0.0,   0.0,  0.0, 0.0 ],
        &[0.0, 1.0,   0.29, 0.0, -0.5],
        &[0.0, 0.29,  1.0,  0.0, 0.0 ],
        &[0.0, 0.0,   0.0,  1.0, 0.0 ],
        &[0.0, -0.5,  0.0,  0.0, 1.0 ],
    ])?;
    let portfolio = Portfolio::new(assets, correlation)?;

    let gammas = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0];
    let points = efficient_frontier(&portfolio, &gammas, &Settings::default())?;

    println!("{:>6}  {:>8}  {:>8}  {:>8}", "gamma", "return", "risk", "rf");
    for point in &points {
        let s = &point.solution;
        println!(
            "{:>6.1}  {:>7.2}%  {:>7.2}%  {:>7.2}%",
            point.risk_aversion,
            s.expected_return * 100.0,
            s.std_dev * 100.0,
            s[0] * 100.0
        );
    }

    println!("\nLower risk aversion buys return with risk!");
    Ok(())
}
