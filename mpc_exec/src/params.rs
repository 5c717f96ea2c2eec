//! # MPC Exec Parameters
//!
//! Parameters shared by the pipeline stages, loaded from `mpc_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::optimiser::RolloutParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the MPC exec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Actuation latency, the time between a command being computed and it
    /// taking effect on the vehicle.
    ///
    /// Units: seconds
    pub latency_s: f64,

    /// Distance between the front axle and the centre of gravity.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Physical steering angle corresponding to a normalised steering demand
    /// of 1.
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Multiplier converting the simulator speed into meters/second.
    pub speed_conv_factor: f64,

    /// Which y coordinate the cross track error is measured from.
    #[serde(default)]
    pub cte_mode: CteMode,

    /// Reference rollout optimiser parameters
    pub optimiser: RolloutParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reference y coordinate used when computing the cross track error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CteMode {
    /// Measure from the vehicle frame origin, the cross track error is the
    /// constant term of the reference curve.
    #[default]
    VehicleFrame,

    /// Subtract the latency-projected world frame y coordinate of the vehicle
    /// from the curve value at the origin. Kept for compatibility with older
    /// controller tunings.
    WorldY,
}

/// Errors raised when validating parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Wheelbase must be positive, found {0} m")]
    InvalidWheelbase(f64),

    #[error("Maximum steering angle must be positive, found {0} rad")]
    InvalidMaxSteer(f64),

    #[error("Speed conversion factor must be positive, found {0}")]
    InvalidSpeedConv(f64),

    #[error("Latency must be finite, non-negative and representable as a duration, found {0} s")]
    InvalidLatency(f64),

    #[error("Optimiser horizon must contain at least 2 steps, found {0}")]
    InvalidHorizon(usize),

    #[error("Optimiser step must be positive, found {0} s")]
    InvalidStep(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// The actuation latency as a duration.
    ///
    /// Fails for negative, non-finite, or unrepresentably large latencies.
    pub fn latency(&self) -> Result<Duration, ParamsError> {
        Duration::try_from_secs_f64(self.latency_s)
            .map_err(|_| ParamsError::InvalidLatency(self.latency_s))
    }

    /// Check that all parameters are physically meaningful.
    pub fn validate(&self) -> Result<(), ParamsError> {
        // NaN fails every comparison, so the checks are written to reject it
        if !(self.wheelbase_m > 0.0) {
            return Err(ParamsError::InvalidWheelbase(self.wheelbase_m));
        }
        if !(self.max_steer_rad > 0.0) {
            return Err(ParamsError::InvalidMaxSteer(self.max_steer_rad));
        }
        if !(self.speed_conv_factor > 0.0) {
            return Err(ParamsError::InvalidSpeedConv(self.speed_conv_factor));
        }
        self.latency()?;
        if self.optimiser.horizon_steps < 2 {
            return Err(ParamsError::InvalidHorizon(self.optimiser.horizon_steps));
        }
        if !(self.optimiser.step_s > 0.0) {
            return Err(ParamsError::InvalidStep(self.optimiser.step_s));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            latency_s: 0.1,
            wheelbase_m: 2.67,
            max_steer_rad: 0.4363323,
            speed_conv_factor: 0.44704,
            cte_mode: CteMode::VehicleFrame,
            optimiser: RolloutParams::default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_shipped_params_parse() {
        let params: Params =
            util::params::from_str(include_str!("../../params/mpc_exec.toml")).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.cte_mode, CteMode::VehicleFrame);
        assert_eq!(params.optimiser.horizon_steps, 10);
        assert_eq!(params.latency_s, 0.1);
    }

    #[test]
    fn test_cte_mode_parse() {
        let mut toml_str = String::from(include_str!("../../params/mpc_exec.toml"));
        toml_str = toml_str.replace("\"vehicle_frame\"", "\"world_y\"");

        let params: Params = util::params::from_str(&toml_str).unwrap();
        assert_eq!(params.cte_mode, CteMode::WorldY);
    }

    #[test]
    fn test_invalid() {
        let mut p = Params::default();
        p.wheelbase_m = 0.0;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidWheelbase(_))));

        let mut p = Params::default();
        p.max_steer_rad = f64::NAN;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidMaxSteer(_))));

        let mut p = Params::default();
        p.latency_s = -0.1;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidLatency(_))));

        let mut p = Params::default();
        p.latency_s = f64::INFINITY;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidLatency(_))));

        // Finite but beyond what a Duration can hold
        let mut p = Params::default();
        p.latency_s = 1e20;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidLatency(_))));

        let mut p = Params::default();
        p.optimiser.horizon_steps = 1;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidHorizon(1))));
    }
}
