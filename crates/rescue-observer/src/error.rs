//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rescue_core::playback::PlaybackError;
use rescue_core::session::SessionError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// No run is loaded.
    #[error("no active run")]
    NoActiveRun,

    /// The request conflicts with the current playback state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An invalid query parameter or body value was provided.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<SessionError> for ObserverError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoActiveRun => Self::NoActiveRun,
            SessionError::Playback { source } => match source {
                PlaybackError::NoTimeline | PlaybackError::AtEnd { .. } => {
                    Self::Conflict(source.to_string())
                }
                PlaybackError::IntervalTooShort { .. } => Self::InvalidRequest(source.to_string()),
            },
            SessionError::World { .. } | SessionError::Timeline { .. } => {
                Self::InvalidRequest(err.to_string())
            }
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::NoActiveRun => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
