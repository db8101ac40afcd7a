//! Observer API server for the rescue simulation replay viewer.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/rounds`) streaming the live position
//!   every time the cursor moves, via [`tokio::sync::broadcast`]
//! - **REST endpoints** for querying the live round (status, agents,
//!   cells, timeline)
//! - **Control endpoints** for seeking and playback (jump, step, turn,
//!   play, pause, speed)
//! - **Minimal HTML page** (`GET /`) showing the current position and
//!   links to the API endpoints
//!
//! # Architecture
//!
//! Every handler locks the shared [`ReplaySession`] for the duration of
//! one read or one control operation. Control handlers broadcast the new
//! position after every change, and the playback loop does the same after
//! every tick, so `WebSocket` clients never need to poll.
//!
//! [`ReplaySession`]: rescue_core::session::ReplaySession

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_observer;
pub use state::{AppState, BroadcastTrigger, RoundBroadcast};
