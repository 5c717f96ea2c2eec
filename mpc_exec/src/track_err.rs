//! # Tracking error estimation
//!
//! Cross track and heading error of the vehicle relative to the reference
//! curve, evaluated at the vehicle frame origin.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::ref_fit::RefCoeffs;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackingError {
    /// Cross track error, positive when the curve passes to the left of the
    /// reference point.
    ///
    /// Units: meters
    pub cte_m: f64,

    /// Heading error, the negative of the curve tangent angle at the origin.
    ///
    /// Units: radians
    pub epsi_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Estimate the tracking errors.
///
/// `ref_y` is subtracted from the curve value at the origin. In the vehicle
/// frame this is zero, so the cross track error is simply the constant term of
/// the curve.
pub fn estimate(coeffs: &RefCoeffs, ref_y: f64) -> TrackingError {
    TrackingError {
        cte_m: coeffs.eval(0.0) - ref_y,
        epsi_rad: -coeffs.eval_deriv(0.0).atan(),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_on_curve() {
        let e = estimate(&RefCoeffs::default(), 0.0);

        assert_eq!(e.cte_m, 0.0);
        assert_eq!(e.epsi_rad, 0.0);
    }

    #[test]
    fn test_offset_and_slope() {
        let e = estimate(&RefCoeffs([1.5, 1.0, 0.3, -0.02]), 0.0);

        assert_eq!(e.cte_m, 1.5);
        assert!((e.epsi_rad + FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_ref_y_subtracted() {
        let e = estimate(&RefCoeffs([1.5, 0.0, 0.0, 0.0]), 108.73);

        assert!((e.cte_m - (1.5 - 108.73)).abs() < 1e-12);
    }

    #[test]
    fn test_higher_terms_ignored() {
        let a = estimate(&RefCoeffs([0.2, -0.1, 0.0, 0.0]), 0.0);
        let b = estimate(&RefCoeffs([0.2, -0.1, 5.0, -3.0]), 0.0);

        assert_eq!(a, b);
    }
}
