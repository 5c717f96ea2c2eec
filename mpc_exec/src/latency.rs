//! # Latency compensation
//!
//! A command computed now only takes effect after the actuation latency has
//! elapsed, so the pipeline works from where the vehicle will be at that point
//! rather than where it was measured. The measured pose is stepped forward
//! through the kinematic bicycle model using the command that is currently
//! being applied.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    cmd_translator::denormalise_steer,
    params::Params,
    pose::{ControlCommand, Pose},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Projects measured poses forward by a fixed actuation latency.
#[derive(Debug, Clone, Copy)]
pub struct LatencyCompensator {
    latency_s: f64,
    wheelbase_m: f64,
    max_steer_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LatencyCompensator {
    pub fn new(latency_s: f64, wheelbase_m: f64, max_steer_rad: f64) -> Self {
        Self {
            latency_s,
            wheelbase_m,
            max_steer_rad,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.latency_s, params.wheelbase_m, params.max_steer_rad)
    }

    /// Predict the pose at the moment a new command would take effect, given
    /// the measured pose and the command currently applied.
    pub fn project(&self, measured: &Pose, applied: &ControlCommand) -> Pose {
        let steer_rad = denormalise_steer(applied.steering, self.max_steer_rad);

        measured.step_bicycle(steer_rad, applied.throttle, self.wheelbase_m, self.latency_s)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn comp() -> LatencyCompensator {
        LatencyCompensator::new(0.1, 2.67, 0.4363323)
    }

    #[test]
    fn test_stationary_no_command() {
        let p = comp().project(&Pose::default(), &ControlCommand::default());
        assert_eq!(p, Pose::default());
    }

    #[test]
    fn test_right_steer_turns_clockwise() {
        let measured = Pose {
            x_m: 0.0,
            y_m: 0.0,
            heading_rad: 0.0,
            speed_ms: 10.0,
        };
        let cmd = ControlCommand {
            steering: 1.0,
            throttle: 0.0,
        };

        let p = comp().project(&measured, &cmd);

        // Positive (right) simulator steering reduces the heading
        let expected = -10.0 / 2.67 * 0.4363323 * 0.1;
        assert!((p.heading_rad - expected).abs() < 1e-12);
        assert!((p.x_m - 1.0).abs() < 1e-12);
        assert_eq!(p.y_m, 0.0);
    }

    #[test]
    fn test_throttle_is_accel() {
        let measured = Pose {
            speed_ms: 5.0,
            ..Pose::default()
        };
        let cmd = ControlCommand {
            steering: 0.0,
            throttle: -0.5,
        };

        let p = comp().project(&measured, &cmd);
        assert!((p.speed_ms - 4.95).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let c = comp();
        let measured = Pose {
            x_m: -40.62,
            y_m: 108.73,
            heading_rad: 3.733651,
            speed_ms: 13.4,
        };
        let cmd = ControlCommand {
            steering: -0.12,
            throttle: 0.3,
        };

        let a = c.project(&measured, &cmd);
        let b = c.project(&measured, &cmd);
        let fresh = comp().project(&measured, &cmd);

        assert_eq!(a, b);
        assert_eq!(a, fresh);
    }

    #[test]
    fn test_zero_latency_identity() {
        let c = LatencyCompensator::new(0.0, 2.67, 0.4363323);
        let measured = Pose {
            x_m: 1.0,
            y_m: 2.0,
            heading_rad: 0.3,
            speed_ms: 20.0,
        };
        let cmd = ControlCommand {
            steering: 0.5,
            throttle: 1.0,
        };

        assert_eq!(c.project(&measured, &cmd), measured);
    }

    proptest! {
        #[test]
        fn prop_projection_reproducible(
            x in -500.0f64..500.0,
            y in -500.0f64..500.0,
            heading in -4.0f64..4.0,
            speed in 0.0f64..40.0,
            steering in -1.0f64..=1.0,
            throttle in -1.0f64..=1.0,
        ) {
            let measured = Pose { x_m: x, y_m: y, heading_rad: heading, speed_ms: speed };
            let cmd = ControlCommand { steering, throttle };

            let first = comp().project(&measured, &cmd);
            let second = comp().project(&measured, &cmd);
            prop_assert_eq!(first, second);

            // Distance covered is the initial speed times the latency
            let dist = ((first.x_m - x).powi(2) + (first.y_m - y).powi(2)).sqrt();
            prop_assert!((dist - speed * 0.1).abs() < 1e-9);
        }
    }
}
