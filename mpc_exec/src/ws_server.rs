//! # WebSocket server
//!
//! The simulator connects over WebSocket and streams telemetry frames. Each
//! connection gets its own [`ControlLoop`] and optimiser instance, and frames
//! on a connection are handled strictly one at a time. The hold before a
//! steering response is sent suspends only the connection's own task.
//!
//! Plain HTTP requests get a placeholder page on `/` and an empty body
//! anywhere else.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::Uri,
    response::{Html, IntoResponse},
    Router,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{error, info, trace, warn};
use std::{fmt::Display, sync::Arc};
use thiserror::Error;

use crate::{
    ctrl_loop::{ControlLoop, CycleError, Response},
    optimiser::RolloutOptimiser,
    params::Params,
};
use util::module::State as ModuleState;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Page served on the root path to plain HTTP requests.
pub const PLACEHOLDER_PAGE: &str = "<h1>Hello world!</h1>";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State shared by all connections. Read only.
#[derive(Clone)]
pub struct ServerState {
    pub params: Arc<Params>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which end a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Control loop error: {0}")]
    Cycle(CycleError),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the router serving both WebSocket upgrades and plain HTTP on every
/// path.
pub fn router(params: Arc<Params>) -> Router {
    Router::new()
        .fallback(entry)
        .with_state(ServerState { params })
}

/// Body returned to plain HTTP requests for the given path.
pub fn fallback_page(path: &str) -> &'static str {
    if path == "/" {
        PLACEHOLDER_PAGE
    } else {
        ""
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

async fn entry(
    uri: Uri,
    State(state): State<ServerState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> axum::response::Response {
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_connection(socket, state.params))
            .into_response(),
        Err(_) => {
            trace!("HTTP request for {}", uri.path());
            Html(fallback_page(uri.path())).into_response()
        }
    }
}

/// Serve one simulator connection until it closes.
async fn handle_connection(socket: WebSocket, params: Arc<Params>) {
    info!("Simulator connected");

    let mut ctrl = ControlLoop::new(RolloutOptimiser::new(&params));
    if let Err(e) = ctrl.init((*params).clone()) {
        error!("Could not initialise the control loop: {}", e);
        return;
    }

    let (outbound, inbound) = socket.split();
    run_connection(inbound, outbound, ctrl).await;

    info!("Simulator disconnected");
}

/// Feed inbound frames to the control loop one at a time, until the stream
/// ends, a close frame arrives, or a send fails.
///
/// The next frame is not read until the response to the current one has been
/// sent.
async fn run_connection<R, W, E>(
    mut inbound: R,
    mut outbound: W,
    mut ctrl: ControlLoop<RolloutOptimiser>,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    W: Sink<Message> + Unpin,
    W::Error: Display,
    E: Display,
{
    while let Some(msg) = inbound.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        if let Err(e) = process_frame(&mut outbound, &mut ctrl, &text).await {
            warn!("Closing connection: {}", e);
            break;
        }
    }
}

/// Run one control cycle on a text frame and send its response, if any.
async fn process_frame<W>(
    outbound: &mut W,
    ctrl: &mut ControlLoop<RolloutOptimiser>,
    text: &str,
) -> Result<(), ConnectionError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    match ctrl.proc(text) {
        Ok((Response::Steer { frame, hold }, report)) => {
            trace!("Cycle report: {:?}", report);

            tokio::time::sleep(hold).await;
            ctrl.hold_elapsed().map_err(ConnectionError::Cycle)?;

            outbound
                .send(Message::Text(frame))
                .await
                .map_err(|e| ConnectionError::Socket(e.to_string()))?;
            ctrl.cycle_complete().map_err(ConnectionError::Cycle)?;
        }
        Ok((Response::Manual(frame), _)) => {
            outbound
                .send(Message::Text(frame))
                .await
                .map_err(|e| ConnectionError::Socket(e.to_string()))?;
        }
        Ok((Response::Ignore, _)) => (),
        Err(e @ CycleError::MalformedOutput(_)) => {
            error!("Optimiser contract violated, cycle dropped: {}", e)
        }
        Err(e) => warn!("Cycle dropped: {}", e),
    }

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use comms_if::sim::MANUAL_FRAME;
    use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use std::convert::Infallible;
    use tokio::{
        task::JoinHandle,
        time::{Duration, Instant},
    };
    use tower::ServiceExt;

    const STRAIGHT_ROAD: &str = "42[\"telemetry\",{\"ptsx\":[10,20,30,40],\"ptsy\":[0,0,0,0],\"x\":0,\"y\":0,\"psi\":0,\"speed\":0,\"steering_angle\":0,\"throttle\":0}]";

    type Inbound = UnboundedSender<Result<Message, Infallible>>;

    /// Start a connection task fed from a channel, returning the inbound
    /// sender, the outbound receiver and the task handle.
    fn connection() -> (Inbound, UnboundedReceiver<Message>, JoinHandle<()>) {
        let params = Params::default();
        let mut ctrl = ControlLoop::new(RolloutOptimiser::new(&params));
        ctrl.init(params).unwrap();

        let (in_tx, in_rx) = mpsc::unbounded();
        let (out_tx, out_rx) = mpsc::unbounded();
        let task = tokio::spawn(run_connection(in_rx, out_tx, ctrl));

        (in_tx, out_rx, task)
    }

    fn send_text(tx: &Inbound, text: &str) {
        tx.unbounded_send(Ok(Message::Text(text.into()))).unwrap();
    }

    async fn recv_text(rx: &mut UnboundedReceiver<Message>) -> String {
        match rx.next().await {
            Some(Message::Text(t)) => t,
            m => panic!("Expected a text frame, got {:?}", m),
        }
    }

    async fn get(path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let app = router(Arc::new(Params::default()));

        let resp = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_root_placeholder() {
        let (status, content_type, body) = get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert_eq!(body, PLACEHOLDER_PAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_other_path_empty() {
        let (status, _, body) = get("/socket.io/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[test]
    fn test_fallback_page() {
        assert_eq!(fallback_page("/"), PLACEHOLDER_PAGE);
        assert_eq!(fallback_page("/index.html"), "");
        assert_eq!(fallback_page(""), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_steer_held_for_latency() {
        let hold = Params::default().latency().unwrap();
        let (in_tx, mut out_rx, task) = connection();
        let start = Instant::now();

        // Both frames are queued before the first response is due
        send_text(&in_tx, STRAIGHT_ROAD);
        send_text(&in_tx, STRAIGHT_ROAD);

        let first = recv_text(&mut out_rx).await;
        assert!(first.starts_with("42[\"steer\""));
        assert!(start.elapsed() >= hold);

        // The second frame is only read once the first response has gone out
        let second = recv_text(&mut out_rx).await;
        assert!(second.starts_with("42[\"steer\""));
        assert!(start.elapsed() >= 2 * hold);

        drop(in_tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_sent_without_hold() {
        let (in_tx, mut out_rx, task) = connection();
        let start = Instant::now();

        send_text(&in_tx, "2");
        send_text(&in_tx, "42");
        send_text(&in_tx, "42[\"telemetry\",null]");

        // Ignored frames produce nothing, so the first reply is the manual one
        assert_eq!(recv_text(&mut out_rx).await, MANUAL_FRAME);
        assert_eq!(start.elapsed(), Duration::ZERO);

        drop(in_tx);
        task.await.unwrap();
        assert!(out_rx.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_frame_ends_connection() {
        let (in_tx, mut out_rx, task) = connection();

        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        send_text(&in_tx, STRAIGHT_ROAD);

        task.await.unwrap();
        assert!(out_rx.next().await.is_none());
    }
}
