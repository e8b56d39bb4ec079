//! Remote notes store client
//!
//! Pushes the note record to the remote store. The remote performs an
//! upsert keyed on the note's `url`: an existing record is replaced in
//! place, otherwise the record is inserted. Failures are recoverable: the
//! local in-memory record stays the source of truth and the user retries
//! manually, so there is no automatic retry here.

use async_trait::async_trait;
use reqwest::Client;
use shared::models::note::Note;
use std::time::Duration;

use crate::utils::AppError;

/// Request timeout for remote saves
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Seam between the notes manager and the remote store implementation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert or replace the record stored under `note.url`
    async fn upsert_note(&self, note: &Note) -> Result<(), AppError>;
}

/// HTTP client for the remote notes API
pub struct NotesSyncService {
    client: Client,
    base_url: String,
}

impl NotesSyncService {
    /// The `base_url` should be the base URL of the remote notes store
    /// (e.g. "https://notes.example.com").
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl RemoteStore for NotesSyncService {
    async fn upsert_note(&self, note: &Note) -> Result<(), AppError> {
        let url = format!("{}/api/notes/upsert", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(note)
            .send()
            .await
            .map_err(|e| AppError::remote(format!("Remote save request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(format!(
                "Remote save failed with status {status}: {body}"
            )));
        }

        Ok(())
    }
}
