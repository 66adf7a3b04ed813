//! Euclidean projection onto `{x : l ≤ x ≤ u, Σ x = total}`.
//!
//! The projection of `y` is `x_i = clamp(y_i + τ, l_i, u_i)` for the shift
//! `τ` at which the clamped sum hits `total`. The clamped sum is
//! non-decreasing in `τ`, so `τ` is found by bracketing and bisection.

/// Bisection steps; enough to pin `τ` to the last bit of a double.
const BISECTION_STEPS: usize = 200;

/// Bracket doublings before giving up.
const MAX_DOUBLINGS: usize = 1100;

fn clamped_sum(point: &[f64], lower: &[f64], upper: &[f64], tau: f64) -> f64 {
    point
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&y, (&l, &u))| (y + tau).max(l).min(u))
        .sum()
}

/// Project `point` onto the box `[lower, upper]` intersected with the
/// hyperplane `Σ x = total`.
///
/// Returns `None` when the intersection is empty. Bounds must satisfy
/// `lower ≤ upper` elementwise.
pub fn project_onto_budget_box(
    point: &[f64],
    lower: &[f64],
    upper: &[f64],
    total: f64,
) -> Option<Vec<f64>> {
    let n = point.len();
    if n == 0 || lower.len() != n || upper.len() != n {
        return None;
    }

    let eps = 1e-12 * (1.0 + total.abs());
    let lower_sum: f64 = lower.iter().sum();
    let upper_sum: f64 = upper.iter().sum();
    if lower_sum > total + eps || upper_sum < total - eps {
        return None;
    }
    if (lower_sum - total).abs() <= eps {
        return Some(lower.to_vec());
    }
    if (upper_sum - total).abs() <= eps {
        return Some(upper.to_vec());
    }

    let mut lo = -1.0;
    let mut hi = 1.0;
    let mut doublings = 0;
    while clamped_sum(point, lower, upper, lo) > total {
        lo *= 2.0;
        doublings += 1;
        if doublings > MAX_DOUBLINGS {
            return None;
        }
    }
    while clamped_sum(point, lower, upper, hi) < total {
        hi *= 2.0;
        doublings += 1;
        if doublings > MAX_DOUBLINGS {
            return None;
        }
    }

    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if clamped_sum(point, lower, upper, mid) < total {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let tau = 0.5 * (lo + hi);
    let mut x: Vec<f64> = point
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&y, (&l, &u))| (y + tau).max(l).min(u))
        .collect();

    // Push the rounding residual into whichever coordinates have room.
    let mut residual = total - x.iter().sum::<f64>();
    for i in 0..n {
        if residual == 0.0 {
            break;
        }
        let room = if residual > 0.0 {
            upper[i] - x[i]
        } else {
            lower[i] - x[i]
        };
        let shift = if residual > 0.0 {
            residual.min(room)
        } else {
            residual.max(room)
        };
        x[i] += shift;
        residual -= shift;
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn sum(x: &[f64]) -> f64 {
        x.iter().sum()
    }

    #[test]
    fn test_interior_point_shifts_uniformly() {
        let x = project_onto_budget_box(&[0.5, 0.5, 0.5], &[0.0; 3], &[1.0; 3], 1.0).unwrap();
        for v in &x {
            assert!((v - 1.0 / 3.0).abs() < TOL);
        }
    }

    #[test]
    fn test_respects_upper_bounds() {
        let lower = [-1.0, 0.001, 0.001, 0.001, 0.001];
        let upper = [1.0, f64::INFINITY, f64::INFINITY, 0.15, 0.1];
        let x = project_onto_budget_box(&[0.2; 5], &lower, &upper, 1.0).unwrap();
        assert!((sum(&x) - 1.0).abs() < TOL);
        assert!((x[3] - 0.15).abs() < TOL);
        assert!((x[4] - 0.1).abs() < TOL);
        assert!((x[0] - 0.25).abs() < 1e-10);
        assert!((x[1] - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_feasible_point_is_fixed() {
        let point = [0.1, 0.6, 0.3];
        let x = project_onto_budget_box(&point, &[0.0; 3], &[1.0; 3], 1.0).unwrap();
        for (a, b) in x.iter().zip(point.iter()) {
            assert!((a - b).abs() < TOL);
        }
    }

    #[test]
    fn test_zero_total_with_zero_inside_box() {
        let x = project_onto_budget_box(&[0.0; 4], &[-0.5; 4], &[0.5; 4], 0.0).unwrap();
        assert!(x.iter().all(|v| v.abs() < TOL));
    }

    #[test]
    fn test_infeasible_returns_none() {
        assert!(project_onto_budget_box(&[0.0; 2], &[0.8, 0.7], &[1.0, 1.0], 1.0).is_none());
        assert!(project_onto_budget_box(&[0.0; 2], &[0.0, 0.0], &[0.3, 0.3], 1.0).is_none());
    }

    #[test]
    fn test_tight_bounds_return_vertex() {
        let x = project_onto_budget_box(&[5.0, -5.0], &[0.4, 0.6], &[1.0, 1.0], 1.0).unwrap();
        assert_eq!(x, vec![0.4, 0.6]);
    }

    #[test]
    fn test_far_away_point() {
        let x = project_onto_budget_box(&[1e6, -1e6, 3.0], &[0.0; 3], &[1.0; 3], 1.0).unwrap();
        assert!((sum(&x) - 1.0).abs() < TOL);
        assert!((x[0] - 1.0).abs() < TOL);
    }
}
