//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the shared replay session that the REST endpoints
//! read and control, plus the broadcast channel for position updates.

use rescue_core::playback::PlaybackState;
use rescue_core::session::{ReplaySession, RoundUpdate, SharedSession};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for position updates.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// What moved the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastTrigger {
    /// The playback loop advanced a round.
    Playback,
    /// A control endpoint seeked or changed playback state.
    Control,
    /// A new run started or a delta extended the log.
    Ingest,
    /// Sent once to a client that just connected.
    Connect,
}

/// JSON-serializable position update pushed over the `WebSocket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundBroadcast {
    /// Live round.
    pub round: u32,
    /// Turns applied in the live round.
    pub turn: usize,
    /// Highest round received.
    pub max_round: u32,
    /// Whether the live round is the last one received.
    pub is_end: bool,
    /// Playback state.
    pub playback: PlaybackState,
    /// What caused this update.
    pub trigger: BroadcastTrigger,
}

impl RoundBroadcast {
    /// Build a broadcast from a session position update.
    pub const fn from_update(update: &RoundUpdate, trigger: BroadcastTrigger) -> Self {
        Self {
            round: update.round,
            turn: update.turn,
            max_round: update.max_round,
            is_end: update.is_end,
            playback: update.playback,
            trigger,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for position updates.
    pub tx: broadcast::Sender<RoundBroadcast>,
    /// The replay session every endpoint reads from and controls.
    pub session: SharedSession,
}

impl AppState {
    /// Create application state around an existing session.
    pub fn new(session: SharedSession) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx, session }
    }

    /// Subscribe to the position broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a position update to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, update: &RoundBroadcast) -> usize {
        // send returns Err only when there are zero receivers,
        // which is normal when no WebSocket clients are connected.
        self.tx.send(*update).unwrap_or(0)
    }

    /// Publish the session's current position, if it has a run.
    pub fn broadcast_position(&self, session: &ReplaySession, trigger: BroadcastTrigger) -> usize {
        session
            .round_update()
            .map_or(0, |update| self.broadcast(&RoundBroadcast::from_update(&update, trigger)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ReplaySession::default().into_shared())
    }
}
