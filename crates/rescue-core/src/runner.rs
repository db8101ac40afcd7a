//! Playback loop.
//!
//! [`run_playback`] drives a [`SharedSession`] in real time: while the
//! driver is playing it sleeps one round interval and then ticks the
//! session under its lock. Any control change wakes the loop through
//! [`PlaybackControl`](crate::playback::PlaybackControl), which abandons
//! the pending sleep, so a pause is honoured before the next round is
//! shown. The tick itself re-checks the driver state under the lock.

use tokio::time::sleep;
use tracing::{debug, info};

use crate::session::{RoundUpdate, SharedSession};

/// Callback invoked after each playback tick that moved the cursor.
///
/// Implementations can use this to broadcast the new position to
/// observers, log progress, etc.
pub trait RoundCallback: Send {
    /// Called with the position after the tick.
    fn on_round(&mut self, update: &RoundUpdate);
}

/// A no-op round callback for testing.
pub struct NoOpCallback;

impl RoundCallback for NoOpCallback {
    fn on_round(&mut self, _update: &RoundUpdate) {}
}

/// Run the playback loop until shutdown is requested.
///
/// Returns the number of rounds the loop advanced.
pub async fn run_playback(session: SharedSession, callback: &mut dyn RoundCallback) -> u64 {
    let control = session.lock().await.control();
    let mut rounds_advanced: u64 = 0;

    info!("Playback loop starting");

    loop {
        if control.is_shutdown() {
            break;
        }

        let (playing, interval) = {
            let guard = session.lock().await;
            (guard.driver().is_playing(), guard.driver().round_interval())
        };

        if !playing {
            control.woken().await;
            continue;
        }

        // --- Sleep for the round interval, unless woken first ---
        tokio::select! {
            () = sleep(interval) => {}
            () = control.woken() => {
                debug!("Playback woken before tick, re-reading state");
                continue;
            }
        }

        // --- Tick under the lock ---
        let update = session.lock().await.tick();
        if let Some(update) = update {
            rounds_advanced = rounds_advanced.saturating_add(1);
            callback.on_round(&update);
        }
    }

    info!(rounds_advanced, "Playback loop stopped");
    rounds_advanced
}
