//! Tests for the portfolio statistics model.

use meanvar::prelude::*;
use nalgebra::DMatrix;

const TOL: f64 = 1e-12;

fn market() -> Portfolio {
    Portfolio::new(
        vec![
            Asset::risk_free(0.005).with_bounds((-1.0, 1.0)),
            Asset::new(0.10, 0.16),
            Asset::new(0.04, 0.12),
            Asset::new(0.06, 0.18),
            Asset::new(0.15, 0.65),
        ],
        CorrelationMatrix::from_risky_pairs(4, &[-0.3, 0.4, 0.6, -0.1, -0.2, 0.3]).unwrap(),
    )
    .unwrap()
}

/// Weight vectors probing long, short, levered and degenerate allocations
fn weight_cases() -> Vec<(&'static str, Vec<f64>)> {
    vec![
        ("equal", vec![0.2; 5]),
        ("all_cash", vec![1.0, 0.0, 0.0, 0.0, 0.0]),
        ("levered", vec![-1.0, 1.2, 0.5, 0.2, 0.1]),
        ("short_risky", vec![1.5, -0.3, 0.2, -0.2, -0.2]),
        ("hedged", vec![0.0, 0.5, 0.5, 0.0, 0.0]),
        ("zero", vec![0.0; 5]),
    ]
}

#[test]
fn test_std_dev_non_negative() {
    let p = market();
    for (name, w) in weight_cases() {
        let (_, std) = mean_and_std(&p, &w);
        assert!(std >= 0.0 && std.is_finite(), "case '{}': std {}", name, std);
        assert!(variance(&p, &w) >= 0.0, "case '{}'", name);
    }
}

#[test]
fn test_single_asset_exactness() {
    let p = market();
    for i in 0..p.len() {
        let mut w = vec![0.0; p.len()];
        w[i] = 1.0;
        let (ret, std) = mean_and_std(&p, &w);
        let asset = p.asset(i).unwrap();
        assert_eq!(ret, asset.expected_return, "asset {}", i);
        assert_eq!(std, asset.volatility, "asset {}", i);
    }
}

#[test]
fn test_zero_weights() {
    let p = market();
    assert_eq!(mean_and_std(&p, &[0.0; 5]), (0.0, 0.0));
    assert_eq!(utility(&p, &[0.0; 5], 3.0), 0.0);
}

#[test]
fn test_short_slice_padded_with_zeros() {
    let p = market();
    let full = [0.3, 0.7, 0.0, 0.0, 0.0];
    assert_eq!(mean_and_std(&p, &full[..2]), mean_and_std(&p, &full));
    assert_eq!(mean_and_std(&p, &[]), (0.0, 0.0));
}

#[test]
fn test_permutation_symmetry() {
    let p = market();
    let order = [3, 0, 4, 1, 2];
    let assets: Vec<Asset> = order.iter().map(|&i| p.asset(i).unwrap().clone()).collect();
    let c = p.correlation();
    let permuted = CorrelationMatrix::new(DMatrix::from_fn(5, 5, |a, b| c.get(order[a], order[b])))
        .unwrap();
    let q = Portfolio::new(assets, permuted).unwrap();

    for (name, w) in weight_cases() {
        let v: Vec<f64> = order.iter().map(|&i| w[i]).collect();
        let (r1, s1) = mean_and_std(&p, &w);
        let (r2, s2) = mean_and_std(&q, &v);
        assert!((r1 - r2).abs() < TOL, "case '{}': return {} vs {}", name, r1, r2);
        assert!((s1 - s2).abs() < TOL, "case '{}': std {} vs {}", name, s1, s2);
        let (u1, u2) = (utility(&p, &w, 3.0), utility(&q, &v, 3.0));
        assert!((u1 - u2).abs() < TOL, "case '{}': utility {} vs {}", name, u1, u2);
    }
}

#[test]
fn test_utility_definition() {
    let p = market();
    for (name, w) in weight_cases() {
        for gamma in [0.5, 1.0, 3.0, 10.0] {
            let (ret, std) = mean_and_std(&p, &w);
            let expected = ret - 0.5 * gamma * std * std;
            let got = utility(&p, &w, gamma);
            assert!(
                (got - expected).abs() < TOL,
                "case '{}', gamma {}: expected {}, got {}",
                name,
                gamma,
                expected,
                got
            );
        }
    }
}

#[test]
fn test_risk_free_correlations_ignored() {
    // Correlations with a zero-volatility asset carry no information.
    let c = CorrelationMatrix::from_rows(&[&[1.0, 0.5], &[0.5, 1.0]]).unwrap();
    let p = Portfolio::new(vec![Asset::risk_free(0.01), Asset::new(0.08, 0.2)], c).unwrap();
    assert_eq!(p.correlation().get(0, 1), 0.0);
    let (_, std) = mean_and_std(&p, &[0.5, 0.5]);
    assert!((std - 0.1).abs() < TOL);
}
