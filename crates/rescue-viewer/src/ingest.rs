//! JSON-lines ingestion adapter.
//!
//! Reads one [`IngestEvent`] per line from a file or stdin and feeds it to
//! the shared replay session. Blank lines are skipped, lines that do not
//! decode are logged and skipped, and events the session rejects are
//! counted. Reaching the end of the input marks the run completed.
//!
//! An optional per-line delay replays a recorded file at the pace of a
//! live feed.

use std::sync::Arc;
use std::time::Duration;

use rescue_core::config::SourceConfig;
use rescue_core::session::{IngestOutcome, ReplaySession};
use rescue_observer::state::{AppState, BroadcastTrigger};
use rescue_types::IngestEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::ViewerError;

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank lines read.
    pub lines: u64,
    /// Events the session accepted.
    pub accepted: u64,
    /// Lines that were not a valid event.
    pub undecodable: u64,
    /// Events the session rejected.
    pub rejected: u64,
}

/// Open the configured source and ingest it to the end.
///
/// # Errors
///
/// Returns [`ViewerError::Io`] if the source cannot be opened or read.
pub async fn run_ingest(
    source: SourceConfig,
    state: Arc<AppState>,
) -> Result<IngestReport, ViewerError> {
    let line_delay = Duration::from_millis(source.line_delay_ms);
    match source.path.as_deref().filter(|_| !source.is_stdin()) {
        Some(path) => {
            info!(path = %path.display(), "Reading events from file");
            let file = tokio::fs::File::open(path).await?;
            ingest_lines(BufReader::new(file), &state, line_delay).await
        }
        None => {
            info!("Reading events from stdin");
            ingest_lines(BufReader::new(tokio::io::stdin()), &state, line_delay).await
        }
    }
}

/// Ingest every line of `reader`, then mark the run completed.
///
/// # Errors
///
/// Returns [`ViewerError::Io`] if reading fails. Bad lines are not errors.
pub async fn ingest_lines<R>(
    reader: R,
    state: &AppState,
    line_delay: Duration,
) -> Result<IngestReport, ViewerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut report = IngestReport::default();
    let mut lines = reader.lines();
    let mut line_no: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        line_no = line_no.saturating_add(1);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.lines = report.lines.saturating_add(1);

        let event = match serde_json::from_str::<IngestEvent>(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "undecodable event line skipped");
                report.undecodable = report.undecodable.saturating_add(1);
                continue;
            }
        };

        if !line_delay.is_zero() {
            tokio::time::sleep(line_delay).await;
        }

        let mut session = state.session.lock().await;
        match session.ingest(event) {
            Ok(outcome) => {
                report.accepted = report.accepted.saturating_add(1);
                announce(state, &session, &outcome);
            }
            Err(e) => {
                debug!(line = line_no, error = %e, "event rejected by session");
                report.rejected = report.rejected.saturating_add(1);
            }
        }
    }

    let mut session = state.session.lock().await;
    if session.timeline().is_ok() && !session.is_completed() {
        // Completed never fails.
        if session.ingest(IngestEvent::Completed).is_ok() {
            info!("End of input, run marked completed");
        }
    }

    info!(
        lines = report.lines,
        accepted = report.accepted,
        undecodable = report.undecodable,
        rejected = report.rejected,
        "Ingestion finished"
    );
    Ok(report)
}

/// Tell `WebSocket` clients about a new run or a longer log.
fn announce(state: &AppState, session: &ReplaySession, outcome: &IngestOutcome) {
    match outcome {
        IngestOutcome::RunStarted { .. } | IngestOutcome::Appended { .. } => {
            state.broadcast_position(session, BroadcastTrigger::Ingest);
        }
        IngestOutcome::Completed | IngestOutcome::Disconnected => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_core::playback::PlaybackState;
    use rescue_types::AgentId;

    use super::*;

    const WORLD_INIT: &str = r#"{"type":"world_init","world":{"width":2,"height":1,"start_energy":50,"cells":[{"location":{"x":0,"y":0},"move_cost":1},{"location":{"x":1,"y":0},"move_cost":3,"cell_type":"charging"}]},"spawns":[{"agent_id":1,"team":0,"location":{"x":0,"y":0}}]}"#;

    fn round_line(round: u32, x: i32, energy: i32) -> String {
        format!(
            r#"{{"type":"round","delta":{{"round":{round},"turns":[{{"agent_id":1,"location":{{"x":{x},"y":0}},"energy":{energy}}}]}}}}"#
        )
    }

    async fn ingest_text(state: &AppState, text: &str) -> IngestReport {
        ingest_lines(BufReader::new(text.as_bytes()), state, Duration::ZERO)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn feed_is_ingested_and_completed_at_eof() {
        let state = AppState::default();
        let text = [
            WORLD_INIT.to_owned(),
            String::new(),
            round_line(1, 1, 47),
            "{not json".to_owned(),
            round_line(2, 0, 46),
            round_line(5, 1, 40),
        ]
        .join("\n");

        let report = ingest_text(&state, &text).await;
        assert_eq!(
            report,
            IngestReport {
                lines: 5,
                accepted: 3,
                undecodable: 1,
                rejected: 1,
            }
        );

        let session = state.session.lock().await;
        assert!(session.is_completed());
        let timeline = session.timeline().unwrap();
        assert_eq!(timeline.max_round(), 2);
        assert_eq!(timeline.current_round(), 1);
    }

    #[tokio::test]
    async fn ingest_never_moves_the_cursor() {
        let state = AppState::default();
        let text = [WORLD_INIT.to_owned(), round_line(1, 1, 47), round_line(2, 0, 46)].join("\n");
        ingest_text(&state, &text).await;

        let mut session = state.session.lock().await;
        assert_eq!(session.status().round, 1);
        assert_eq!(session.driver().state(), PlaybackState::Stopped);
        session.jump_to_round(2).unwrap();
        session.jump_to_turn(1).unwrap();
        let agent = session.agent(AgentId::new(1)).unwrap().unwrap();
        assert_eq!(agent.energy, 46);
    }

    #[tokio::test]
    async fn deltas_before_world_init_are_rejected() {
        let state = AppState::default();
        let text = [round_line(1, 1, 47), WORLD_INIT.to_owned()].join("\n");

        let report = ingest_text(&state, &text).await;
        assert_eq!(report.rejected, 1);
        assert_eq!(report.accepted, 1);
        assert_eq!(state.session.lock().await.timeline().unwrap().max_round(), 0);
    }

    #[tokio::test]
    async fn disconnect_leaves_no_run_to_complete() {
        let state = AppState::default();
        let text = [
            WORLD_INIT.to_owned(),
            round_line(1, 1, 47),
            r#"{"type":"disconnected"}"#.to_owned(),
        ]
        .join("\n");

        ingest_text(&state, &text).await;
        let session = state.session.lock().await;
        assert!(session.timeline().is_err());
        assert!(!session.is_completed());
    }

    #[tokio::test]
    async fn new_runs_and_deltas_are_broadcast() {
        let state = AppState::default();
        let mut rx = state.subscribe();
        let text = [WORLD_INIT.to_owned(), round_line(1, 1, 47)].join("\n");
        ingest_text(&state, &text).await;

        let started = rx.try_recv().unwrap();
        assert_eq!(started.max_round, 0);
        assert_eq!(started.trigger, BroadcastTrigger::Ingest);
        let appended = rx.try_recv().unwrap();
        assert_eq!(appended.max_round, 1);
        assert_eq!(appended.round, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn line_delay_paces_the_feed() {
        let state = AppState::default();
        let text = [WORLD_INIT.to_owned(), round_line(1, 1, 47)].join("\n");
        let start = tokio::time::Instant::now();

        ingest_lines(BufReader::new(text.as_bytes()), &state, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
