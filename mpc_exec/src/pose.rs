//! # Pose and state types
//!
//! Types describing where the vehicle is, what it has been told to do, and the
//! reference path it should follow.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use comms_if::sim::Telemetry;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position, heading and speed of the vehicle in the world frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pose {
    /// Position along the world x axis
    pub x_m: f64,

    /// Position along the world y axis
    pub y_m: f64,

    /// Heading measured anticlockwise from the world x axis
    pub heading_rad: f64,

    /// Forward speed
    pub speed_ms: f64,
}

/// A command applied to the vehicle, in the simulator's normalised units.
///
/// Steering is in [-1, 1] with positive values turning right. Throttle is in
/// [-1, 1] and is treated directly as an acceleration by the motion model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlCommand {
    pub steering: f64,
    pub throttle: f64,
}

/// The state vector handed to the optimiser.
///
/// Position and heading are always zero since the state is expressed in the
/// vehicle frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VehicleState {
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
    pub speed_ms: f64,

    /// Cross track error
    pub cte_m: f64,

    /// Heading error
    pub epsi_rad: f64,
}

/// Reference waypoints as `[x, y]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Waypoints(pub Vec<[f64; 2]>);

/// Trajectory points predicted by the optimiser, in the vehicle frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictedTrajectory(pub Vec<[f64; 2]>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Build the measured pose from a telemetry payload, converting the speed
    /// with the given factor.
    pub fn from_telemetry(telemetry: &Telemetry, speed_conv_factor: f64) -> Self {
        Self {
            x_m: telemetry.x,
            y_m: telemetry.y,
            heading_rad: telemetry.psi,
            speed_ms: telemetry.speed * speed_conv_factor,
        }
    }

    /// Advance the pose by one step of the kinematic bicycle model.
    ///
    /// All terms use the speed at the start of the step. `steer_rad` is the
    /// physical steering angle with positive values turning anticlockwise and
    /// `accel` is applied directly as m/s^2.
    pub fn step_bicycle(&self, steer_rad: f64, accel: f64, wheelbase_m: f64, dt_s: f64) -> Self {
        let v = self.speed_ms;

        Self {
            x_m: self.x_m + v * self.heading_rad.cos() * dt_s,
            y_m: self.y_m + v * self.heading_rad.sin() * dt_s,
            heading_rad: self.heading_rad + v / wheelbase_m * steer_rad * dt_s,
            speed_ms: v + accel * dt_s,
        }
    }
}

impl VehicleState {
    /// Create a state at the vehicle frame origin.
    pub fn at_origin(speed_ms: f64, cte_m: f64, epsi_rad: f64) -> Self {
        Self {
            x_m: 0.0,
            y_m: 0.0,
            heading_rad: 0.0,
            speed_ms,
            cte_m,
            epsi_rad,
        }
    }

    /// Get the state as `[x, y, psi, v, cte, epsi]`.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.x_m,
            self.y_m,
            self.heading_rad,
            self.speed_ms,
            self.cte_m,
            self.epsi_rad,
        ]
    }
}

impl Waypoints {
    /// Pair up separate x and y arrays. Extra elements in the longer array are
    /// dropped.
    pub fn from_xy(xs: &[f64], ys: &[f64]) -> Self {
        Self(xs.iter().zip(ys.iter()).map(|(&x, &y)| [x, y]).collect())
    }

    pub fn xs(&self) -> Vec<f64> {
        self.0.iter().map(|p| p[0]).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.0.iter().map(|p| p[1]).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.0.iter()
    }
}

impl PredictedTrajectory {
    pub fn xs(&self) -> Vec<f64> {
        self.0.iter().map(|p| p[0]).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.0.iter().map(|p| p[1]).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
