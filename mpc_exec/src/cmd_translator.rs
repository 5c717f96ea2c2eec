//! # Command translation
//!
//! The optimiser works in physical units with anticlockwise steering positive,
//! while the simulator expects a normalised steering demand with right turns
//! positive. This module converts between the two and unpacks the raw
//! optimiser output buffer, laid out as
//!
//! ```text
//! [steer_rad, throttle, x_1, y_1, x_2, y_2, ...]
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::pose::{ControlCommand, PredictedTrajectory};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TranslateError {
    #[error("Optimiser output must contain at least the steering and throttle values, found {0} elements")]
    TooShort(usize),

    #[error("Optimiser output must have an even length, found {0} elements")]
    OddLength(usize),

    #[error("Optimiser output contains non-finite values")]
    NonFinite,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a physical steering angle into the simulator's normalised steering
/// demand.
pub fn normalise_steer(steer_rad: f64, max_steer_rad: f64) -> f64 {
    -(steer_rad / max_steer_rad)
}

/// Convert a normalised simulator steering demand into a physical steering
/// angle.
pub fn denormalise_steer(steer_norm: f64, max_steer_rad: f64) -> f64 {
    -(steer_norm * max_steer_rad)
}

/// Split raw optimiser output into the command to send and the predicted
/// trajectory.
pub fn translate(
    raw: &[f64],
    max_steer_rad: f64,
) -> Result<(ControlCommand, PredictedTrajectory), TranslateError> {
    if raw.len() < 2 {
        return Err(TranslateError::TooShort(raw.len()));
    }
    if raw.len() % 2 != 0 {
        return Err(TranslateError::OddLength(raw.len()));
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(TranslateError::NonFinite);
    }

    let cmd = ControlCommand {
        steering: normalise_steer(raw[0], max_steer_rad),
        throttle: raw[1],
    };

    let traj = PredictedTrajectory(raw[2..].chunks_exact(2).map(|p| [p[0], p[1]]).collect());

    Ok((cmd, traj))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
