//! # Network Module
//!
//! Parameters describing where the exec listens for the simulator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Address to bind the listener to, for example `"0.0.0.0"`.
    pub bind_address: String,

    /// Port the simulator connects to.
    pub port: u16,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetParams {
    /// The `address:port` string to bind to.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for NetParams {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 4567,
        }
    }
}
