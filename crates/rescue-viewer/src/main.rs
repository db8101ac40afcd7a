//! Replay viewer binary for the rescue simulation.
//!
//! This is the main entry point that wires together the replay session,
//! the JSON-lines ingestion adapter, the playback loop, and the Observer
//! API. It runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `rescue-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Create the shared replay session
//! 4. Start the Observer API server
//! 5. Spawn the ingestion task
//! 6. Spawn the playback loop
//! 7. Wait for `Ctrl-C`, then shut the tasks down

mod error;
mod ingest;
mod observer_callback;

use std::path::PathBuf;
use std::sync::Arc;

use rescue_core::config::{LoggingConfig, ReplayConfig};
use rescue_core::runner;
use rescue_core::session::ReplaySession;
use rescue_observer::server::ServerConfig;
use rescue_observer::state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::ViewerError;
use crate::observer_callback::ObserverCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "rescue-config.yaml";

/// Application entry point for the replay viewer.
///
/// # Errors
///
/// Returns an error if configuration, the observer server, or the signal
/// handler cannot be set up.
#[tokio::main]
async fn main() -> Result<(), ViewerError> {
    // 1. Load configuration. Logging is not up yet, so this is reported below.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = ReplayConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);

    info!("rescue-viewer starting");
    info!(
        config_path = %config_path.display(),
        snapshot_interval = config.timeline.snapshot_interval,
        lazy_snapshots = config.timeline.lazy_snapshots,
        round_interval_ms = config.playback.round_interval_ms,
        autoplay = config.playback.autoplay,
        "Configuration loaded"
    );

    // 3. Create the shared session.
    let session = ReplaySession::from_config(&config).into_shared();
    let control = session.lock().await.control();
    let app_state = Arc::new(AppState::new(Arc::clone(&session)));

    // 4. Start Observer API server.
    let observer_handle = if config.observer.enabled {
        let server_config = ServerConfig::from(&config.observer);
        Some(rescue_observer::spawn_observer(
            server_config,
            Arc::clone(&app_state),
        )?)
    } else {
        info!("Observer API disabled");
        None
    };

    // 5. Spawn ingestion.
    let ingest_state = Arc::clone(&app_state);
    let source = config.source.clone();
    let ingest_handle = tokio::spawn(async move {
        if let Err(e) = ingest::run_ingest(source, ingest_state).await {
            error!(error = %e, "Ingestion stopped with error");
        }
    });

    // 6. Spawn the playback loop.
    let playback_state = Arc::clone(&app_state);
    let playback_handle = tokio::spawn(async move {
        let mut callback = ObserverCallback::new(playback_state);
        runner::run_playback(session, &mut callback).await
    });

    // 7. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    control.request_shutdown();
    ingest_handle.abort();
    let rounds_advanced = playback_handle.await.map_err(|e| ViewerError::Task {
        message: format!("playback task failed: {e}"),
    })?;
    if let Some(handle) = observer_handle {
        handle.abort();
    }

    info!(rounds_advanced, "rescue-viewer shutdown complete");

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
