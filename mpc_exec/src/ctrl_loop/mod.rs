//! # Control loop
//!
//! Sequences the pipeline around each inbound frame for a single connection.
//! One cycle runs through the phases
//!
//! ```text
//! AwaitingMessage -> Decoding -> Compensating -> Transforming -> Fitting
//!     -> Estimating -> Solving -> Translating -> Delaying -> Responding
//!     -> AwaitingMessage
//! ```
//!
//! Frames carrying no usable telemetry take the `Decoding -> ManualFallback
//! -> AwaitingMessage` path instead and never reach the optimiser.
//!
//! The loop does not sleep or send anything itself. A successful cycle ends
//! in `Delaying` with a [`Response::Steer`] naming how long to hold the frame.
//! The caller waits, calls [`ControlLoop::hold_elapsed`], sends the frame and
//! then calls [`ControlLoop::cycle_complete`]. No new frame is accepted until
//! then, so only one cycle is ever in flight.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::{cmd_translator::TranslateError, pose::Pose, ref_fit::{FitError, RefCoeffs}};

pub use state::ControlLoop;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Phases of a control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CyclePhase {
    AwaitingMessage,
    Decoding,
    Compensating,
    Transforming,
    Fitting,
    Estimating,
    Solving,
    Translating,
    Delaying,
    Responding,
    ManualFallback,
}

/// What the caller should do with the result of a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Send the steering frame once `hold` has elapsed.
    Steer { frame: String, hold: Duration },

    /// Send the manual driving acknowledgement immediately.
    Manual(String),

    /// The frame carried no event, send nothing.
    Ignore,
}

/// Errors which abort a cycle. No response is sent for an aborted cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("A frame was received while the previous cycle was still in the {0:?} phase")]
    CycleInProgress(CyclePhase),

    #[error("Expected to be in the {expected:?} phase but was in {found:?}")]
    UnexpectedPhase {
        expected: CyclePhase,
        found: CyclePhase,
    },

    #[error("Could not fit the reference curve: {0}")]
    DegenerateFit(FitError),

    #[error("Optimiser produced malformed output: {0}")]
    MalformedOutput(TranslateError),

    #[error("Could not encode the steering response: {0}")]
    EncodeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Status report for a control cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleReport {
    /// Pose after latency compensation, in the world frame
    pub projected_pose: Pose,

    /// Fitted reference curve
    pub coeffs: RefCoeffs,

    /// Cross track error
    pub cte_m: f64,

    /// Heading error
    pub epsi_rad: f64,

    /// Number of reference waypoints received
    pub num_waypoints: usize,

    /// Time spent in the optimiser
    pub solve_time_s: f64,
}
