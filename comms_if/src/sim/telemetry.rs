//! Inbound telemetry payload

use serde::{Deserialize, Serialize};

/// Telemetry published by the simulator on every update.
///
/// All positions are in the simulator's world frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// X coordinates of the upcoming reference waypoints
    pub ptsx: Vec<f64>,

    /// Y coordinates of the upcoming reference waypoints
    pub ptsy: Vec<f64>,

    /// Vehicle x position
    pub x: f64,

    /// Vehicle y position
    pub y: f64,

    /// Vehicle heading
    ///
    /// Units: radians
    pub psi: f64,

    /// Vehicle speed
    ///
    /// Units: miles/hour
    pub speed: f64,

    /// The steering demand currently applied by the simulator, normalised to [-1, 1]. Positive is
    /// a right turn, opposite to the controller's convention.
    #[serde(default)]
    pub steering_angle: Option<f64>,

    /// The throttle demand currently applied by the simulator, normalised to [-1, 1].
    #[serde(default)]
    pub throttle: Option<f64>,
}
