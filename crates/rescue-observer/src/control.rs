//! Control REST API handlers for seeking and playback.
//!
//! Every control endpoint applies one operation to the shared session,
//! broadcasts the resulting position, and answers with the new status.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/control/jump` | Seek to a round |
//! | `POST` | `/api/control/step` | Seek relative to the live round |
//! | `POST` | `/api/control/turn` | Replay turns of the live round |
//! | `POST` | `/api/control/play` | Start playback |
//! | `POST` | `/api/control/pause` | Pause playback |
//! | `POST` | `/api/control/speed` | Set the playback interval |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use rescue_core::session::{ReplaySession, SessionStatus};
use tracing::info;

use crate::error::ObserverError;
use crate::state::{AppState, BroadcastTrigger};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/control/jump`.
#[derive(Debug, serde::Deserialize)]
pub struct JumpRequest {
    /// Target round. Clamped to the received range.
    pub round: u32,
}

/// Request body for `POST /api/control/step`.
#[derive(Debug, serde::Deserialize)]
pub struct StepRequest {
    /// Rounds to move; negative steps backwards.
    pub delta: i64,
}

/// Request body for `POST /api/control/turn`.
#[derive(Debug, serde::Deserialize)]
pub struct TurnRequest {
    /// Number of turns of the live round to have applied. Forward only.
    pub turn: usize,
}

/// Request body for `POST /api/control/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SpeedRequest {
    /// New playback interval in milliseconds (minimum 10).
    pub round_interval_ms: u64,
}

/// Response body for `POST /api/control/speed`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SpeedResponse {
    /// Interval before the change.
    pub previous_ms: u64,
    /// Interval now in effect.
    pub round_interval_ms: u64,
}

/// Broadcast the session's position and build the response body.
fn respond(state: &AppState, session: &ReplaySession) -> Json<SessionStatus> {
    state.broadcast_position(session, BroadcastTrigger::Control);
    Json(session.status())
}

// ---------------------------------------------------------------------------
// Seeking
// ---------------------------------------------------------------------------

/// Seek to a round.
pub async fn jump(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JumpRequest>,
) -> Result<Json<SessionStatus>, ObserverError> {
    let mut session = state.session.lock().await;
    let outcome = session.jump_to_round(req.round)?;
    info!(
        requested = req.round,
        round = outcome.round,
        rounds_replayed = outcome.rounds_replayed,
        "Seek via control API"
    );
    Ok(respond(&state, &session))
}

/// Seek relative to the live round.
pub async fn step(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StepRequest>,
) -> Result<Json<SessionStatus>, ObserverError> {
    let mut session = state.session.lock().await;
    session.step_round(req.delta)?;
    Ok(respond(&state, &session))
}

/// Replay turns of the live round.
pub async fn turn(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<SessionStatus>, ObserverError> {
    let mut session = state.session.lock().await;
    session.jump_to_turn(req.turn)?;
    Ok(respond(&state, &session))
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Start playback. Fails with 409 without a run or at the last round.
pub async fn play(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionStatus>, ObserverError> {
    let mut session = state.session.lock().await;
    session.play()?;
    info!(round = session.status().round, "Playback started via control API");
    Ok(respond(&state, &session))
}

/// Pause playback.
pub async fn pause(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    let mut session = state.session.lock().await;
    session.pause();
    info!("Playback paused via control API");
    respond(&state, &session)
}

/// Change the playback interval.
pub async fn speed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<SpeedResponse>, ObserverError> {
    let mut session = state.session.lock().await;
    let previous_ms = session.set_round_interval(req.round_interval_ms)?;
    info!(
        previous_ms,
        round_interval_ms = req.round_interval_ms,
        "Playback speed changed via control API"
    );
    Ok(Json(SpeedResponse {
        previous_ms,
        round_interval_ms: req.round_interval_ms,
    }))
}
