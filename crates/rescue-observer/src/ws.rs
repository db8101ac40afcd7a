//! `WebSocket` handler for real-time position streaming.
//!
//! Clients connect to `GET /ws/rounds`. The first message is the current
//! position (trigger `connect`) when a run is loaded, so a late joiner
//! does not have to wait for the cursor to move. After that a
//! [`RoundBroadcast`] arrives every time the cursor moves.
//!
//! A client that falls behind skips the lagged messages; only the latest
//! position matters to a viewer.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, BroadcastTrigger, RoundBroadcast};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming position updates.
///
/// # Route
///
/// `GET /ws/rounds`
pub async fn ws_rounds(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_positions(socket, state))
}

/// The position a newly connected client starts from, encoded for the
/// wire. `None` while no run is loaded.
async fn connect_message(state: &AppState) -> Option<String> {
    let update = state.session.lock().await.round_update()?;
    encode(&RoundBroadcast::from_update(&update, BroadcastTrigger::Connect))
}

fn encode(update: &RoundBroadcast) -> Option<String> {
    serde_json::to_string(update)
        .inspect_err(|e| warn!(round = update.round, error = %e, "round broadcast not encodable"))
        .ok()
}

async fn send_text(socket: &mut WebSocket, text: String) -> ControlFlow<()> {
    if socket.send(Message::Text(text.into())).await.is_err() {
        debug!("WebSocket client gone, send failed");
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

async fn stream_positions(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the position so no move falls in between.
    let mut rx = state.subscribe();
    debug!("WebSocket client connected");

    if let Some(text) = connect_message(&state).await {
        if send_text(&mut socket, text).await.is_break() {
            return;
        }
    }

    loop {
        let flow = tokio::select! {
            received = rx.recv() => match received {
                Ok(update) => match encode(&update) {
                    Some(text) => send_text(&mut socket, text).await,
                    None => ControlFlow::Continue(()),
                },
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "WebSocket client lagged, skipping ahead");
                    ControlFlow::Continue(())
                }
                Err(RecvError::Closed) => {
                    debug!("position channel closed");
                    ControlFlow::Break(())
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client disconnected");
                    ControlFlow::Break(())
                }
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive failed");
                    ControlFlow::Break(())
                }
                // Control goes through the REST API; client text is ignored.
                Some(Ok(_)) => ControlFlow::Continue(()),
            },
        };
        if flow.is_break() {
            return;
        }
    }
}
