//! # Simulator Protocol
//!
//! The simulator speaks a socket-protocol framing over WebSocket text frames. Every event frame
//! starts with the two character prefix `42` (`4` for a message, `2` for an event), followed by a
//! JSON array of exactly two elements:
//!
//! ```text
//! 42["telemetry",{"ptsx":[...],"ptsy":[...],"x":...,"y":...,"psi":...,"speed":...}]
//! ```
//!
//! Frames without the prefix are socket-protocol control frames and carry no event. An event frame
//! whose payload is `null` (or otherwise unusable) means the simulator has no data for us, which
//! is answered with the manual driving acknowledgement [`MANUAL_FRAME`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod steer;
mod telemetry;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde_json::Value;
use thiserror::Error;

pub use steer::SteerData;
pub use telemetry::Telemetry;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix marking a socket-protocol event frame.
pub const EVENT_PREFIX: &str = "42";

/// Name of the inbound telemetry event.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Name of the outbound steering event.
pub const STEER_EVENT: &str = "steer";

/// Response sent when the simulator has no data, handing control back to the driver.
pub const MANUAL_FRAME: &str = "42[\"manual\",{}]";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Frame does not start with the event prefix \"{}\"", EVENT_PREFIX)]
    NotAnEvent,

    #[error("Event body is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Event body is not a JSON array")]
    NotAnArray,

    #[error("Expected an event array of 1 or 2 elements, found {0}")]
    InvalidArity(usize),

    #[error("Event name is not a string")]
    InvalidEventName,

    #[error("Unknown event \"{0}\"")]
    UnknownEvent(String),

    #[error("Event carries no payload")]
    NoPayload,

    #[error("Telemetry payload is invalid: {0}")]
    InvalidPayload(serde_json::Error),

    #[error("Waypoint arrays differ in length (ptsx: {ptsx}, ptsy: {ptsy})")]
    MismatchedWaypoints { ptsx: usize, ptsy: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EnvelopeError {
    /// Returns `true` if this error should be answered with the manual driving acknowledgement.
    ///
    /// Frames which are not events, or are events we don't handle, get no response at all.
    pub fn is_manual_fallback(&self) -> bool {
        !matches!(self, Self::NotAnEvent | Self::UnknownEvent(_))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a telemetry event from a raw text frame.
///
/// Arity and event name are validated before the payload is touched.
pub fn decode_telemetry(frame: &str) -> Result<Telemetry, EnvelopeError> {
    // A bare prefix carries no event either
    let body = frame
        .strip_prefix(EVENT_PREFIX)
        .filter(|b| !b.is_empty())
        .ok_or(EnvelopeError::NotAnEvent)?;

    let value: Value = serde_json::from_str(body).map_err(EnvelopeError::InvalidJson)?;

    let mut elements = match value {
        Value::Array(a) => a,
        _ => return Err(EnvelopeError::NotAnArray),
    };

    if elements.is_empty() || elements.len() > 2 {
        return Err(EnvelopeError::InvalidArity(elements.len()));
    }

    match elements[0] {
        Value::String(ref name) if name == TELEMETRY_EVENT => (),
        Value::String(ref name) => return Err(EnvelopeError::UnknownEvent(name.clone())),
        _ => return Err(EnvelopeError::InvalidEventName),
    }

    // A single element array and an explicit null both mean there is no data
    let payload = match elements.pop() {
        Some(p) if elements.len() == 1 && !p.is_null() => p,
        _ => return Err(EnvelopeError::NoPayload),
    };

    let telemetry: Telemetry =
        serde_json::from_value(payload).map_err(EnvelopeError::InvalidPayload)?;

    if telemetry.ptsx.len() != telemetry.ptsy.len() {
        return Err(EnvelopeError::MismatchedWaypoints {
            ptsx: telemetry.ptsx.len(),
            ptsy: telemetry.ptsy.len(),
        });
    }

    Ok(telemetry)
}

/// Encode steering data into an event frame ready to send.
pub fn encode_steer(data: &SteerData) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string(&(STEER_EVENT, data))?;

    Ok(format!("{}{}", EVENT_PREFIX, body))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
