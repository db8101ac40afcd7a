//! Timeline replay engine for the rescue simulation viewer.
//!
//! This crate turns an append-only stream of per-round deltas into state
//! that can be inspected at any round or turn, and plays it back in real
//! time.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `rescue-config.yaml` into
//!   strongly-typed structs.
//! - [`playback`] -- [`PlaybackDriver`] state machine and the
//!   [`PlaybackControl`] wake-up channel.
//! - [`round`] -- [`Round`], world and agent state at a (round, turn)
//!   position.
//! - [`runner`] -- The async playback loop and [`RoundCallback`].
//! - [`session`] -- [`ReplaySession`], the ingestion boundary and owner of
//!   the current run.
//! - [`snapshot`] -- Snapshot policy and the round-keyed snapshot table.
//! - [`timeline`] -- [`Timeline`], the delta log and seeking algorithm.
//!
//! [`PlaybackDriver`]: playback::PlaybackDriver
//! [`PlaybackControl`]: playback::PlaybackControl
//! [`Round`]: round::Round
//! [`RoundCallback`]: runner::RoundCallback
//! [`ReplaySession`]: session::ReplaySession
//! [`Timeline`]: timeline::Timeline

pub mod config;
pub mod playback;
pub mod round;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod timeline;
