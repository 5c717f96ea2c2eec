//! Outbound steering payload

use serde::{Deserialize, Serialize};

/// Steering response sent back to the simulator.
///
/// The trajectory vectors are in the vehicle frame and are only used for display: the predicted
/// trajectory is drawn in green and the reference waypoints in yellow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteerData {
    /// Normalised steering demand in the simulator's sign convention
    pub steering_angle: f64,

    /// Normalised throttle demand
    pub throttle: f64,

    /// Predicted trajectory x coordinates
    pub mpc_x: Vec<f64>,

    /// Predicted trajectory y coordinates
    pub mpc_y: Vec<f64>,

    /// Reference waypoint x coordinates
    pub next_x: Vec<f64>,

    /// Reference waypoint y coordinates
    pub next_y: Vec<f64>,
}
