//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a session id, registers an outbound queue with the
//! hub and enters a `select!` loop:
//! - Incoming client frames → parse into an `Action` → forward to the hub
//! - Frames queued by the hub → forward to the client
//!
//! Parsing and protocol errors are answered here, to the sender only. Every
//! state change goes through the hub so ordering is decided in one place.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → hub `connect` (welcome, history replay, presence)
//! 2. Client frames → `parse_action` → hub `act`
//! 3. Close or transport error → hub `disconnect`

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, Frame, Status};
use crate::services::dispatch::Action;
use crate::state::AppState;
use crate::stroke::StrokeInput;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFrame(_) => "E_INVALID_FRAME",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();

    // Per-connection queue filled by the hub.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.client_queue_capacity);
    if let Err(e) = state.hub.connect(session_id, client_tx).await {
        warn!(%session_id, error = %e, "ws: hub unavailable; closing");
        return;
    }
    info!(%session_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let Some(reply) = dispatch_text(&state, session_id, text.as_str()).await else {
                            continue;
                        };
                        if send_frame(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = client_rx.recv() => {
                // The hub dropped our queue: it rejected or outlived us.
                let Some(frame) = frame else { break };
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Err(e) = state.hub.disconnect(session_id).await {
        warn!(%session_id, error = %e, "ws: disconnect not delivered");
    }
    info!(%session_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse one inbound text message and hand it to the hub. Returns an error
/// frame for the sender when the message never reached the hub.
async fn dispatch_text(state: &AppState, session_id: Uuid, text: &str) -> Option<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%session_id, error = %e, "ws: invalid inbound frame");
            let err = ProtocolError::InvalidFrame(e.to_string());
            return Some(Frame::request("gateway:error", Data::new()).error_from(&err));
        }
    };

    let action = match parse_action(&req) {
        Ok(action) => action,
        Err(reply) => {
            debug!(%session_id, syscall = %req.syscall, "ws: rejected inbound frame");
            return Some(reply);
        }
    };

    let request_id = req.id;
    match state.hub.act(session_id, action, req).await {
        Ok(()) => None,
        Err(e) => {
            let mut reply = Frame::request("gateway:error", Data::new()).error_from(&e);
            reply.parent_id = Some(request_id);
            Some(reply)
        }
    }
}

/// Translate a request frame into an `Action`, or the error frame to return.
pub(crate) fn parse_action(req: &Frame) -> Result<Action, Frame> {
    if req.status != Status::Request {
        return Err(req.error_from(&ProtocolError::InvalidFrame("inbound frames must have status request".into())));
    }

    match (req.prefix(), req.op()) {
        ("stroke", "draw") => {
            let payload = serde_json::Value::Object(req.data.clone().into_iter().collect());
            StrokeInput::from_value(payload)
                .map(Action::Draw)
                .map_err(|e| req.error_from(&e))
        }
        ("stroke", "undo") => Ok(Action::Undo),
        ("stroke", "redo") => Ok(Action::Redo),
        ("cursor", "move") => Ok(Action::CursorMove { x: number(&req.data, "x"), y: number(&req.data, "y") }),
        _ => Err(req.error_from(&ProtocolError::UnknownSyscall(req.syscall.clone()))),
    }
}

/// Lenient numeric read for ephemeral cursor payloads.
fn number(data: &Data, key: &str) -> f64 {
    data.get(key).and_then(serde_json::Value::as_f64).unwrap_or(0.0)
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.data.get("code").and_then(|v| v.as_str()).unwrap_or("-");
        debug!(id = %frame.id, syscall = %frame.syscall, %code, "ws: send error frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
