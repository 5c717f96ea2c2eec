//! # MPC library.
//!
//! The measurement to control preprocessing pipeline for the receding-horizon
//! trajectory controller. On each telemetry update the pipeline compensates
//! for actuation latency, moves the reference waypoints into the vehicle
//! frame, fits a reference curve, derives the tracking errors, calls the
//! optimiser and translates its output back into simulator commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Exec parameters
pub mod params;

/// Pose, command, state and waypoint types shared by the pipeline
pub mod pose;

/// Latency compensation - projects the measured pose forward by the actuation delay
pub mod latency;

/// World to vehicle frame transformation
pub mod frame;

/// Reference curve fitting - least squares cubic through the vehicle frame waypoints
pub mod ref_fit;

/// Cross track and heading error estimation
pub mod track_err;

/// Translation of raw optimiser output into simulator commands
pub mod cmd_translator;

/// Optimiser interface and the reference rollout optimiser
pub mod optimiser;

/// Control loop - sequences the pipeline around each telemetry frame
pub mod ctrl_loop;

/// WebSocket and HTTP server the simulator connects to
pub mod ws_server;
