//! Main MPC executable entry point.
//!
//! # Architecture
//!
//! The executable serves the simulator over WebSocket. Each connection runs
//! its own control loop:
//!
//!     - Receive a telemetry frame
//!     - Compensate for actuation latency
//!     - Transform the reference waypoints into the vehicle frame
//!     - Fit the reference curve and estimate the tracking errors
//!     - Solve for the next command
//!     - Hold for the actuation latency, then send the command
//!
//! # Usage
//!
//! `mpc_exec [PARAMS_FILE]`
//!
//! With no argument the parameters are loaded from
//! `$MPC_SW_ROOT/params/mpc_exec.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info};
use std::{env, sync::Arc};

// Internal
use comms_if::net::NetParams;
use mpc_lib::{params::Params, ws_server};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("mpc_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("MPC Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params: Params = match args.len() {
        1 => util::params::load("mpc_exec.toml").wrap_err("Could not load exec params")?,
        2 => {
            info!("Loading parameters from \"{}\"", &args[1]);
            util::params::load_from_path(&args[1]).wrap_err("Could not load exec params")?
        }
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };
    params.validate().wrap_err("Invalid exec params")?;

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");
    debug!("{:#?}", params);

    // ---- START SERVER ----

    let endpoint = net_params.endpoint();
    let listener = tokio::net::TcpListener::bind(&endpoint)
        .await
        .wrap_err_with(|| format!("Failed to bind to {}", endpoint))?;

    info!("Listening for the simulator on {}", endpoint);

    axum::serve(listener, ws_server::router(Arc::new(params)))
        .await
        .wrap_err("Server failed")?;

    info!("End of execution");

    Ok(())
}
