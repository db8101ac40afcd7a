//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin viewer access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, handlers, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/rounds` -- `WebSocket` position stream
/// - `GET /api/status` -- position and playback state
/// - `GET /api/timeline` -- delta log length and snapshot table
/// - `GET /api/agents` -- list agents, optionally on one cell
/// - `GET /api/agents/{id}` -- single agent
/// - `GET /api/cells/{x}/{y}` -- single cell with layers and occupants
/// - `POST /api/control/{jump,step,turn,play,pause,speed}` -- seeking and
///   playback control
///
/// CORS allows any origin so a viewer served from another port can
/// connect during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/rounds", get(ws::ws_rounds))
        // REST API
        .route("/api/status", get(handlers::get_status))
        .route("/api/timeline", get(handlers::get_timeline))
        .route("/api/agents", get(handlers::list_agents))
        .route("/api/agents/{id}", get(handlers::get_agent))
        .route("/api/cells/{x}/{y}", get(handlers::get_cell))
        // Control API
        .route("/api/control/jump", post(control::jump))
        .route("/api/control/step", post(control::step))
        .route("/api/control/turn", post(control::turn))
        .route("/api/control/play", post(control::play))
        .route("/api/control/pause", post(control::pause))
        .route("/api/control/speed", post(control::speed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
