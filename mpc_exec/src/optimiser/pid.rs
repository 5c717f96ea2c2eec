//! PID controller used by the rollout optimiser

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error, `dt_s` seconds
    /// after the previous call.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        // With no elapsed time neither the integral nor the derivative can be
        // updated meaningfully
        let deriv = if dt_s > 0.0 {
            self.integral += error * dt_s;

            match self.prev_error {
                Some(e) => (error - e) / dt_s,
                None => 0f64,
            }
        } else {
            0f64
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(2.0, 0.0, 0.0);

        assert_eq!(pid.get(0.5, 0.1), 1.0);
        assert_eq!(pid.get(-0.25, 0.1), -0.5);
    }

    #[test]
    fn test_integral() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);

        pid.get(1.0, 0.5);
        let out = pid.get(1.0, 0.5);

        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(0.0, 0.0, 1.0);

        // No previous error on the first call
        assert_eq!(pid.get(1.0, 0.1), 0.0);
        assert!((pid.get(1.5, 0.1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dt() {
        let mut pid = PidController::new(1.0, 1.0, 1.0);

        pid.get(1.0, 0.1);
        assert_eq!(pid.get(2.0, 0.0), 2.0 + 0.1);
    }
}
