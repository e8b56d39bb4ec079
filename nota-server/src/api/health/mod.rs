//! Health check route
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /health | GET | Status, version and working-note summary |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Url of the note currently being worked on
    #[serde(skip_serializing_if = "Option::is_none")]
    current_note_url: Option<String>,
    /// Whether the working note has edits not yet saved remotely
    has_unsaved_changes: bool,
    /// Whether a remote notes store is configured
    remote_configured: bool,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        current_note_url: state.notes.current().map(|n| n.url),
        has_unsaved_changes: state.notes.has_unsaved_remote_changes(),
        remote_configured: state.remote.is_some(),
    })
}
