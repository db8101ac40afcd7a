//! REST API read handlers for the Observer server.
//!
//! All handlers read the live round of the shared replay session. Reads
//! never move the cursor.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Position, playback state, run summary |
//! | `GET` | `/api/timeline` | Log length and snapshot table |
//! | `GET` | `/api/agents` | All agents, optionally filtered by `x` and `y` |
//! | `GET` | `/api/agents/{id}` | Single agent |
//! | `GET` | `/api/cells/{x}/{y}` | Cell, its layers, and the agents on it |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use rescue_core::session::SessionStatus;
use rescue_types::{Agent, AgentId, CellType, Location, WorldObject};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter and response structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/agents` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct AgentsQuery {
    /// Only agents in this column. Requires `y`.
    pub x: Option<i32>,
    /// Only agents in this row. Requires `x`.
    pub y: Option<i32>,
}

/// Response body for `GET /api/cells/{x}/{y}`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CellView {
    /// The cell's location.
    pub location: Location,
    /// Energy cost of moving into the cell.
    pub move_cost: u32,
    /// Terrain kind.
    pub cell_type: CellType,
    /// Content layers, bottom first.
    pub layers: Vec<WorldObject>,
    /// The top layer, if any.
    pub top_layer: Option<WorldObject>,
    /// Agents standing on the cell.
    pub agents: Vec<Agent>,
}

/// Response body for `GET /api/timeline`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TimelineView {
    /// Live round.
    pub current_round: u32,
    /// Highest round received.
    pub max_round: u32,
    /// Rounds with a captured snapshot, ascending.
    pub snapshot_rounds: Vec<u32>,
    /// Snapshot interval in rounds.
    pub snapshot_interval: u32,
    /// Whether seeks use interval snapshots and the live round.
    pub lazy_snapshots: bool,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the replay position and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.session.lock().await.status();
    let run = if status.active {
        format!("{}x{} grid, {} agents", status.width, status.height, status.agent_count)
    } else {
        "no active run".to_owned()
    };
    let playback = format!("{:?}", status.playback);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Rescue Replay Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
    </style>
</head>
<body>
    <h1>Rescue Replay Observer</h1>
    <p>{run}</p>
    <div>
        <div class="metric"><div class="label">Round</div><div class="value">{round} / {max_round}</div></div>
        <div class="metric"><div class="label">Turn</div><div class="value">{turn} / {turns}</div></div>
        <div class="metric"><div class="label">Playback</div><div class="value">{playback}</div></div>
        <div class="metric"><div class="label">Snapshots</div><div class="value">{snapshots}</div></div>
    </div>
    <ul>
        <li><a href="/api/status">/api/status</a></li>
        <li><a href="/api/timeline">/api/timeline</a></li>
        <li><a href="/api/agents">/api/agents</a></li>
        <li>/ws/rounds (WebSocket)</li>
    </ul>
</body>
</html>"#,
        round = status.round,
        max_round = status.max_round,
        turn = status.turn,
        turns = status.turns_in_round,
        snapshots = status.snapshot_count,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the session status. Works with or without an active run.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.session.lock().await.status())
}

// ---------------------------------------------------------------------------
// GET /api/timeline
// ---------------------------------------------------------------------------

/// Return the delta log length and the snapshot table.
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimelineView>, ObserverError> {
    let session = state.session.lock().await;
    let timeline = session.timeline()?;
    let policy = timeline.policy();
    Ok(Json(TimelineView {
        current_round: timeline.current_round(),
        max_round: timeline.max_round(),
        snapshot_rounds: timeline.snapshot_rounds(),
        snapshot_interval: policy.interval(),
        lazy_snapshots: policy.is_lazy(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/agents
// ---------------------------------------------------------------------------

/// List agents in the live round, optionally only those on one cell.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentsQuery>,
) -> Result<Json<Vec<Agent>>, ObserverError> {
    let session = state.session.lock().await;
    let agents = match (query.x, query.y) {
        (Some(x), Some(y)) => session.agents_at(Location::new(x, y))?,
        (None, None) => session.agents()?,
        _ => {
            return Err(ObserverError::InvalidRequest(
                "x and y must be given together".to_owned(),
            ));
        }
    };
    Ok(Json(agents))
}

// ---------------------------------------------------------------------------
// GET /api/agents/{id}
// ---------------------------------------------------------------------------

/// Return a single agent from the live round.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Agent>, ObserverError> {
    let agent_id = AgentId::new(id);
    let agent = state.session.lock().await.agent(agent_id)?;
    agent
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("agent {agent_id}")))
}

// ---------------------------------------------------------------------------
// GET /api/cells/{x}/{y}
// ---------------------------------------------------------------------------

/// Return one cell of the live round with its layers and occupants.
pub async fn get_cell(
    State(state): State<Arc<AppState>>,
    Path((x, y)): Path<(i32, i32)>,
) -> Result<Json<CellView>, ObserverError> {
    let location = Location::new(x, y);
    let session = state.session.lock().await;
    let cell = session
        .cell_at(location)?
        .ok_or_else(|| ObserverError::NotFound(format!("cell {location}")))?;
    let agents = session.agents_at(location)?;
    let top_layer = cell.top_layer().cloned();

    Ok(Json(CellView {
        location: cell.location,
        move_cost: cell.move_cost,
        cell_type: cell.cell_type,
        layers: cell.layers,
        top_layer,
        agents,
    }))
}
