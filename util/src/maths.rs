//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Apply polynomial coefficients to a value.
///
/// Coefficients are in ascending power order, i.e. if there are 3 coefficients
/// the result is `c[0] + c[1]*x + c[2]*x^2`. An empty slice evaluates to zero.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    // Horner's method, starting from the highest power
    coeffs
        .iter()
        .rev()
        .fold(T::zero(), |acc, &c| acc * value + c)
}

/// Evaluate the first derivative of a polynomial at a value.
///
/// Coefficients are in ascending power order, as for [`poly_val`].
pub fn poly_deriv_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(T::zero(), |acc, (i, &c)| {
            // i always fits in T for any realistic polynomial order
            let power = T::from(i).unwrap_or_else(T::nan);
            acc * value + c * power
        })
}

/// Clamp a value between a minimum and maximum.
///
/// `NaN` values are passed through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}
