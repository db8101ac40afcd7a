//! Observer server startup helper for embedding in the viewer binary.
//!
//! Provides [`spawn_observer`] which launches the Observer HTTP + `WebSocket`
//! server on a background Tokio task, so the API runs alongside ingestion
//! and the playback loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rescue_core::session::ReplaySession;
//! use rescue_observer::{AppState, ServerConfig, spawn_observer};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(ReplaySession::default().into_shared()));
//! let handle = spawn_observer(ServerConfig::default(), state)?;
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The address is validated before the task is spawned; the bind itself
/// happens inside the task and a failure there is logged. The server runs
/// until the runtime shuts down or the returned handle is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address cannot be
/// parsed.
pub fn spawn_observer(
    config: ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let addr = config.socket_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(handle)
}
