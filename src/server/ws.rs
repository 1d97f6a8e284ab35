//! WebSocket handler for real-time store events.
//!
//! Clients connect to `/ws` and receive JSON events:
//! - `{ "type": "token_updated", "data": { ...token... } }`
//! - `{ "type": "changes", "data": { "version": 7, "kind": "inserted", "ids": [...] } }`
//! - `{ "type": "load_error", "data": { "message": "..." } }`
//!
//! Text frames sent by a client are treated as feed messages and merged
//! into the store.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AppState;

/// WebSocket upgrade handler at GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.pipeline.subscribe();
    let session = Uuid::new_v4();

    info!(session = %session, "WebSocket client connected");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            // Forward store events to the client
            event = rx.recv() => {
                match event {
                    Ok(evt) => match serde_json::to_string(&evt) {
                        Ok(json) => {
                            if socket.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Failed to serialize event"),
                    },
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, session = %session, "WS client lagged, skipped events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        if let Some(change) = state.pipeline.ingest_raw(&text) {
                            debug!(session = %session, version = change.version, "Applied client feed frame");
                        }
                    }
                    Some(Err(e)) => {
                        debug!(session = %session, error = %e, "WebSocket receive error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!(session = %session, "WebSocket client disconnected");
}
