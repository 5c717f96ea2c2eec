//! # Optimiser interface
//!
//! The trajectory optimiser consumes the vehicle state and the reference curve
//! and produces a flat output buffer. For a horizon of `N` steps the buffer
//! holds `2 + 2 * (N - 1)` values: the first steering angle (radians,
//! anticlockwise positive) and throttle, followed by the `(x, y)` pairs of the
//! predicted trajectory in the vehicle frame.
//!
//! An optimiser instance may keep internal state between calls, so each
//! connection must own its own instance.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod pid;
mod rollout;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{pose::VehicleState, ref_fit::RefCoeffs};

pub use pid::PidController;
pub use rollout::{RolloutOptimiser, RolloutParams};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A receding-horizon trajectory optimiser.
pub trait Optimiser {
    /// Solve for the next command and predicted trajectory.
    fn solve(&mut self, state: &VehicleState, coeffs: &RefCoeffs) -> Vec<f64>;
}
