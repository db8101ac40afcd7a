//! Round callback that pushes playback progress to the Observer API.

use std::sync::Arc;

use rescue_core::runner::RoundCallback;
use rescue_core::session::RoundUpdate;
use rescue_observer::state::{AppState, BroadcastTrigger, RoundBroadcast};
use tracing::debug;

/// Callback that bridges the playback loop to `WebSocket` clients.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl RoundCallback for ObserverCallback {
    fn on_round(&mut self, update: &RoundUpdate) {
        let broadcast = RoundBroadcast::from_update(update, BroadcastTrigger::Playback);
        let receivers = self.state.broadcast(&broadcast);
        debug!(round = update.round, receivers, "Round broadcast sent");
    }
}
