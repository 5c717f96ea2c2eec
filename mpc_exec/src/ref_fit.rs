//! # Reference curve fitting
//!
//! Fits a cubic `y = c0 + c1 x + c2 x^2 + c3 x^3` through the vehicle frame
//! waypoints in the least squares sense.
//!
//! The fit is solved by Householder QR on the Vandermonde design matrix
//! rather than by forming the normal equations, which square the condition
//! number and lose accuracy when the waypoints are close together or almost
//! collinear. All shapes are known at compile time so the decomposition is
//! written out directly over fixed width rows.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use crate::pose::Waypoints;
use util::maths::{poly_deriv_val, poly_val};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Degree of the reference polynomial
pub const POLY_DEGREE: usize = 3;

/// Number of coefficients in the reference polynomial
pub const NUM_COEFFS: usize = POLY_DEGREE + 1;

/// Relative size below which a column of the design matrix is considered to
/// be linearly dependent on the previous ones.
const RANK_TOLERANCE: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Reference curve coefficients in ascending power order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RefCoeffs(pub [f64; NUM_COEFFS]);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Cannot fit a degree {} curve through {found} points, at least {required} are needed", POLY_DEGREE)]
    InsufficientPoints { found: usize, required: usize },

    #[error("Waypoints contain non-finite values")]
    NonFinite,

    #[error("Waypoints do not determine a unique curve (column {column} of the design matrix is dependent)")]
    RankDeficient { column: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RefCoeffs {
    /// Evaluate the curve at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        poly_val(x, &self.0)
    }

    /// Evaluate the first derivative of the curve at `x`.
    pub fn eval_deriv(&self, x: f64) -> f64 {
        poly_deriv_val(x, &self.0)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Fit the reference curve to the given vehicle frame waypoints.
pub fn fit(points: &Waypoints) -> Result<RefCoeffs, FitError> {
    let num_points = points.len();

    if num_points < NUM_COEFFS {
        return Err(FitError::InsufficientPoints {
            found: num_points,
            required: NUM_COEFFS,
        });
    }

    if points
        .iter()
        .any(|p| !p[0].is_finite() || !p[1].is_finite())
    {
        return Err(FitError::NonFinite);
    }

    // Build the Vandermonde matrix and the right hand side
    let mut a: Vec<[f64; NUM_COEFFS]> = points
        .iter()
        .map(|p| {
            let mut row = [1f64; NUM_COEFFS];
            for j in 1..NUM_COEFFS {
                row[j] = row[j - 1] * p[0];
            }
            row
        })
        .collect();
    let mut b: Vec<f64> = points.iter().map(|p| p[1]).collect();

    // Dependence is judged relative to the largest column
    let scale = (0..NUM_COEFFS)
        .map(|j| col_norm(&a, j, 0))
        .fold(0f64, f64::max);

    // Householder reduction of A to upper triangular R, applying the same
    // reflections to b to give Q^T b
    for k in 0..NUM_COEFFS {
        let norm = col_norm(&a, k, k);

        if norm <= RANK_TOLERANCE * scale {
            return Err(FitError::RankDeficient { column: k });
        }

        // Pick the sign that avoids cancellation in v[0]
        let alpha = if a[k][k] >= 0.0 { -norm } else { norm };

        let mut v: Vec<f64> = a[k..].iter().map(|row| row[k]).collect();
        v[0] -= alpha;
        let v_norm_sq: f64 = v.iter().map(|e| e * e).sum();

        for j in k..NUM_COEFFS {
            let dot: f64 = v
                .iter()
                .zip(a[k..].iter())
                .map(|(vi, row)| vi * row[j])
                .sum();
            let f = 2.0 * dot / v_norm_sq;
            for (vi, row) in v.iter().zip(a[k..].iter_mut()) {
                row[j] -= f * vi;
            }
        }

        let dot: f64 = v.iter().zip(b[k..].iter()).map(|(vi, bi)| vi * bi).sum();
        let f = 2.0 * dot / v_norm_sq;
        for (vi, bi) in v.iter().zip(b[k..].iter_mut()) {
            *bi -= f * vi;
        }
    }

    // Back substitution on R c = (Q^T b)[0..NUM_COEFFS]
    let mut coeffs = [0f64; NUM_COEFFS];
    for k in (0..NUM_COEFFS).rev() {
        let mut acc = b[k];
        for j in (k + 1)..NUM_COEFFS {
            acc -= a[k][j] * coeffs[j];
        }
        coeffs[k] = acc / a[k][k];
    }

    Ok(RefCoeffs(coeffs))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Euclidean norm of column `col` from row `from` downwards.
fn col_norm(a: &[[f64; NUM_COEFFS]], col: usize, from: usize) -> f64 {
    a[from..]
        .iter()
        .map(|row| row[col] * row[col])
        .sum::<f64>()
        .sqrt()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn points_on(coeffs: &[f64], xs: &[f64]) -> Waypoints {
        Waypoints(xs.iter().map(|&x| [x, poly_val(x, coeffs)]).collect())
    }

    #[test]
    fn test_exact_cubic() {
        let truth = [1.0, -2.0, 0.5, 0.25];
        let pts = points_on(&truth, &[0.0, 1.0, 2.0, 3.0]);

        let c = fit(&pts).unwrap();

        for (a, b) in c.0.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-9, "{:?} != {:?}", c.0, truth);
        }
        for p in pts.iter() {
            assert!((c.eval(p[0]) - p[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_exact_cubic_overdetermined() {
        let truth = [-3.0, 0.1, 0.02, -0.001];
        let pts = points_on(&truth, &[5.0, 12.0, 20.0, 31.0, 45.0, 60.0]);

        let c = fit(&pts).unwrap();

        for p in pts.iter() {
            assert!((c.eval(p[0]) - p[1]).abs() < 1e-7);
        }
    }

    #[test]
    fn test_straight_road() {
        let pts = Waypoints(vec![[10.0, 0.0], [20.0, 0.0], [30.0, 0.0], [40.0, 0.0]]);

        let c = fit(&pts).unwrap();

        for v in c.0.iter() {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn test_least_squares_residual_orthogonal() {
        // Quartic data cannot be matched exactly, the residual must be
        // orthogonal to every column of the design matrix
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let pts = points_on(&[0.0, -1.0, 0.0, 0.0, 0.01], &xs);

        let c = fit(&pts).unwrap();

        for power in 0..NUM_COEFFS as i32 {
            let dot: f64 = pts
                .iter()
                .map(|p| (p[1] - c.eval(p[0])) * p[0].powi(power))
                .sum();
            assert!(dot.abs() < 1e-6, "power {}: {}", power, dot);
        }
    }

    #[test]
    fn test_insufficient_points() {
        let pts = Waypoints(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 4.0]]);

        assert_eq!(
            fit(&pts),
            Err(FitError::InsufficientPoints {
                found: 3,
                required: 4
            })
        );
        assert!(fit(&Waypoints::default()).is_err());
    }

    #[test]
    fn test_rank_deficient() {
        // Only two distinct x positions
        let pts = Waypoints(vec![[1.0, 0.0], [1.0, 1.0], [2.0, 0.5], [2.0, 0.7]]);

        assert!(matches!(fit(&pts), Err(FitError::RankDeficient { .. })));
    }

    #[test]
    fn test_non_finite() {
        let pts = Waypoints(vec![[0.0, 0.0], [1.0, f64::NAN], [2.0, 0.0], [3.0, 0.0]]);

        assert_eq!(fit(&pts), Err(FitError::NonFinite));
    }

    #[test]
    fn test_eval_deriv() {
        let c = RefCoeffs([1.0, 2.0, 3.0, 4.0]);

        assert_eq!(c.eval(0.0), 1.0);
        assert_eq!(c.eval_deriv(0.0), 2.0);
        assert_eq!(c.eval(1.0), 10.0);
        assert_eq!(c.eval_deriv(1.0), 2.0 + 6.0 + 12.0);
    }
}
