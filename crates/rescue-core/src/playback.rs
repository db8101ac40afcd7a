//! Playback driver: auto-advances the timeline one round per interval.
//!
//! The [`PlaybackDriver`] is a small state machine with no clock of its own.
//! Something else decides when an interval has elapsed and calls
//! [`PlaybackDriver::tick`]; in the viewer that is
//! [`run_playback`](crate::runner::run_playback). Keeping time out of the
//! driver means every transition is testable without sleeping.
//!
//! [`PlaybackControl`] is the shared side channel the loop sleeps on, so a
//! pause or speed change takes effect before the pending tick fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::config::MIN_ROUND_INTERVAL_MS;
use crate::timeline::Timeline;

/// Default time between auto-advanced rounds.
pub const DEFAULT_ROUND_INTERVAL_MS: u64 = 200;

/// Playback state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No run, or a run that was never played.
    #[default]
    Stopped,
    /// Advancing one round per interval.
    Playing,
    /// Held on the current round.
    Paused,
}

/// Why playback could not start or be reconfigured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// There is no timeline to play.
    #[error("no active run to play")]
    NoTimeline,

    /// The live round is already the last round in the log.
    #[error("already at the last round ({round})")]
    AtEnd {
        /// The live round.
        round: u32,
    },

    /// The requested interval is below the minimum.
    #[error("round interval must be at least {min_ms} ms, got {requested_ms} ms")]
    IntervalTooShort {
        /// Smallest accepted interval.
        min_ms: u64,
        /// What was asked for.
        requested_ms: u64,
    },
}

/// Result of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing happened.
    Idle,
    /// Moved to `round`; more rounds remain.
    Advanced {
        /// The new live round.
        round: u32,
    },
    /// Moved to (or was already on) the last round and paused.
    ReachedEnd {
        /// The new live round.
        round: u32,
    },
}

/// Playing/paused state plus the round interval.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    /// Current state.
    state: PlaybackState,
    /// Whether the last pause came from reaching the end of the log.
    auto_paused: bool,
    /// Time between rounds while playing.
    round_interval: Duration,
}

impl PlaybackDriver {
    /// Create a stopped driver. Intervals below the minimum are raised to it.
    pub fn new(round_interval_ms: u64) -> Self {
        Self {
            state: PlaybackState::Stopped,
            auto_paused: false,
            round_interval: Duration::from_millis(round_interval_ms.max(MIN_ROUND_INTERVAL_MS)),
        }
    }

    /// Start playing.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoTimeline`] without a timeline, or
    /// [`PlaybackError::AtEnd`] when there is nothing left to play.
    pub fn play(&mut self, timeline: Option<&Timeline>) -> Result<(), PlaybackError> {
        let timeline = timeline.ok_or(PlaybackError::NoTimeline)?;
        if timeline.is_end() {
            return Err(PlaybackError::AtEnd {
                round: timeline.current_round(),
            });
        }
        self.state = PlaybackState::Playing;
        self.auto_paused = false;
        Ok(())
    }

    /// Hold on the current round.
    pub const fn pause(&mut self) {
        self.state = PlaybackState::Paused;
        self.auto_paused = false;
    }

    /// Take ownership of an end-of-log pause after the user moved the
    /// cursor. New rounds no longer resume playback on their own.
    pub const fn release_auto_pause(&mut self) {
        self.auto_paused = false;
    }

    /// Return to the stopped state.
    pub const fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.auto_paused = false;
    }

    /// Advance the timeline by one round if playing, pausing at the end.
    pub fn tick(&mut self, timeline: &mut Timeline) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::Idle;
        }
        let round = timeline.step_round(1).round;
        if timeline.is_end() {
            self.state = PlaybackState::Paused;
            self.auto_paused = true;
            return TickOutcome::ReachedEnd { round };
        }
        TickOutcome::Advanced { round }
    }

    /// Change the round interval. Returns the previous interval in ms.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::IntervalTooShort`] below the minimum.
    pub fn set_round_interval_ms(&mut self, ms: u64) -> Result<u64, PlaybackError> {
        if ms < MIN_ROUND_INTERVAL_MS {
            return Err(PlaybackError::IntervalTooShort {
                min_ms: MIN_ROUND_INTERVAL_MS,
                requested_ms: ms,
            });
        }
        let previous = self.round_interval_ms();
        self.round_interval = Duration::from_millis(ms);
        Ok(previous)
    }

    /// Current state.
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the driver is playing.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Whether the driver paused itself on reaching the end of the log.
    pub const fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    /// Time between rounds.
    pub const fn round_interval(&self) -> Duration {
        self.round_interval
    }

    /// Time between rounds in milliseconds.
    pub fn round_interval_ms(&self) -> u64 {
        u64::try_from(self.round_interval.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_INTERVAL_MS)
    }
}

/// Wake-up channel between control surfaces and the playback loop.
///
/// Shared through an [`Arc`](std::sync::Arc). Wakes are not lost: a wake
/// issued while the loop is busy is delivered on its next wait.
#[derive(Debug, Default)]
pub struct PlaybackControl {
    /// Wakes the loop after a state or speed change.
    wake: Notify,
    /// Set once the loop should exit.
    shutdown: AtomicBool,
}

impl PlaybackControl {
    /// Create a control channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the playback loop so it re-reads the driver state.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Wait for the next wake.
    pub async fn woken(&self) {
        self.wake.notified().await;
    }

    /// Ask the playback loop to exit.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
