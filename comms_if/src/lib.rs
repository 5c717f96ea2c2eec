//! # Communications interface crate.
//!
//! Provides the wire protocol spoken between the simulator and the MPC exec.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator event envelope, telemetry and steering messages
pub mod sim;

/// Network parameters
pub mod net;
