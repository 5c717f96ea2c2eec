//! # Reference rollout optimiser
//!
//! A lightweight stand-in for a full nonlinear optimiser. The first command is
//! produced by PID laws on the cross track and heading errors plus a
//! proportional speed law. The predicted trajectory is found by rolling the
//! bicycle model forward over the horizon, applying the same laws to the
//! errors predicted at each step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use super::{Optimiser, PidController};
use crate::{
    params::Params,
    pose::{Pose, VehicleState},
    ref_fit::RefCoeffs,
};
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the rollout optimiser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutParams {
    /// Number of steps in the horizon, including the current one.
    pub horizon_steps: usize,

    /// Duration of each horizon step.
    ///
    /// Units: seconds
    pub step_s: f64,

    /// Speed the vehicle should settle at.
    ///
    /// Units: meters/second
    pub ref_speed_ms: f64,

    /// Cross track error gains
    pub cte_k_p: f64,
    pub cte_k_i: f64,
    pub cte_k_d: f64,

    /// Heading error gains
    pub epsi_k_p: f64,
    pub epsi_k_i: f64,
    pub epsi_k_d: f64,

    /// Proportional gain from speed error to throttle
    pub speed_k_p: f64,
}

/// Rollout optimiser, one per connection.
#[derive(Debug, Clone)]
pub struct RolloutOptimiser {
    params: RolloutParams,
    wheelbase_m: f64,
    max_steer_rad: f64,

    cte_ctrl: PidController,
    epsi_ctrl: PidController,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RolloutParams {
    fn default() -> Self {
        Self {
            horizon_steps: 10,
            step_s: 0.1,
            ref_speed_ms: 22.0,
            cte_k_p: 0.15,
            cte_k_i: 0.0,
            cte_k_d: 0.05,
            epsi_k_p: 0.9,
            epsi_k_i: 0.0,
            epsi_k_d: 0.05,
            speed_k_p: 0.2,
        }
    }
}

impl RolloutOptimiser {
    pub fn new(params: &Params) -> Self {
        let p = params.optimiser.clone();

        Self {
            cte_ctrl: PidController::new(p.cte_k_p, p.cte_k_i, p.cte_k_d),
            epsi_ctrl: PidController::new(p.epsi_k_p, p.epsi_k_i, p.epsi_k_d),
            params: p,
            wheelbase_m: params.wheelbase_m,
            max_steer_rad: params.max_steer_rad,
        }
    }

    /// Compute a steering angle and throttle from the given errors and speed.
    fn command(
        &self,
        cte_ctrl: &mut PidController,
        epsi_ctrl: &mut PidController,
        cte_m: f64,
        epsi_rad: f64,
        speed_ms: f64,
    ) -> (f64, f64) {
        // A curve to the left (positive cte) and a negative heading error
        // both call for anticlockwise steering
        let steer_rad = clamp(
            cte_ctrl.get(cte_m, self.params.step_s) - epsi_ctrl.get(epsi_rad, self.params.step_s),
            -self.max_steer_rad,
            self.max_steer_rad,
        );
        let throttle = clamp(
            self.params.speed_k_p * (self.params.ref_speed_ms - speed_ms),
            -1.0,
            1.0,
        );

        (steer_rad, throttle)
    }
}

impl Optimiser for RolloutOptimiser {
    fn solve(&mut self, state: &VehicleState, coeffs: &RefCoeffs) -> Vec<f64> {
        let n = self.params.horizon_steps.max(1);
        let mut out = Vec::with_capacity(2 * n);

        // The first command advances the live controllers, the rollout works
        // on copies so that predictions do not feed back into the next cycle
        let mut cte_ctrl = self.cte_ctrl.clone();
        let mut epsi_ctrl = self.epsi_ctrl.clone();
        let (steer_rad, throttle) = self.command(
            &mut cte_ctrl,
            &mut epsi_ctrl,
            state.cte_m,
            state.epsi_rad,
            state.speed_ms,
        );
        self.cte_ctrl = cte_ctrl.clone();
        self.epsi_ctrl = epsi_ctrl.clone();

        out.push(steer_rad);
        out.push(throttle);

        let mut pose = Pose {
            x_m: state.x_m,
            y_m: state.y_m,
            heading_rad: state.heading_rad,
            speed_ms: state.speed_ms,
        };
        let (mut steer, mut accel) = (steer_rad, throttle);

        for _ in 1..n {
            pose = pose.step_bicycle(steer, accel, self.wheelbase_m, self.params.step_s);
            out.push(pose.x_m);
            out.push(pose.y_m);

            let cte_m = coeffs.eval(pose.x_m) - pose.y_m;
            let epsi_rad = pose.heading_rad - coeffs.eval_deriv(pose.x_m).atan();
            let next = self.command(&mut cte_ctrl, &mut epsi_ctrl, cte_m, epsi_rad, pose.speed_ms);
            steer = next.0;
            accel = next.1;
        }

        trace!(
            "Rollout: steer {:.4} rad, throttle {:.3}, {} predicted points",
            steer_rad,
            throttle,
            n - 1
        );

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
    fn test_output_layout() {
        let params = Params::default();
        let mut opt = RolloutOptimiser::new(&params);

        let out = opt.solve(&VehicleState::at_origin(10.0, 0.0, 0.0), &RefCoeffs::default());

        assert_eq!(out.len(), 2 * params.optimiser.horizon_steps);
        assert_eq!(out.len() % 2, 0);
    }

    #[test]
    fn test_on_track_at_speed() {
        let params = Params::default();
        let v = params.optimiser.ref_speed_ms;
        let mut opt = RolloutOptimiser::new(&params);

        let out = opt.solve(&VehicleState::at_origin(v, 0.0, 0.0), &RefCoeffs::default());

        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);

        // Straight ahead along x at constant speed
        for (i, p) in out[2..].chunks_exact(2).enumerate() {
            let expected_x = v * params.optimiser.step_s * (i + 1) as f64;
            assert!((p[0] - expected_x).abs() < 1e-9);
            assert!(p[1].abs() < 1e-12);
        }
    }

    #[test]
    fn test_steers_towards_curve() {
        let params = Params::default();
        let mut opt = RolloutOptimiser::new(&params);

        // Curve 1 m to the left
        let coeffs = RefCoeffs([1.0, 0.0, 0.0, 0.0]);
        let out = opt.solve(&VehicleState::at_origin(10.0, 1.0, 0.0), &coeffs);
        assert!(out[0] > 0.0);

        // Curve 1 m to the right
        let mut opt = RolloutOptimiser::new(&params);
        let coeffs = RefCoeffs([-1.0, 0.0, 0.0, 0.0]);
        let out = opt.solve(&VehicleState::at_origin(10.0, -1.0, 0.0), &coeffs);
        assert!(out[0] < 0.0);
    }

    #[test]
    fn test_limits() {
        let params = Params::default();
        let mut opt = RolloutOptimiser::new(&params);

        let out = opt.solve(
            &VehicleState::at_origin(0.0, 100.0, -1.0),
            &RefCoeffs([100.0, 1.0, 0.0, 0.0]),
        );

        assert_eq!(out[0], params.max_steer_rad);
        assert_eq!(out[1], 1.0);
    }
}
