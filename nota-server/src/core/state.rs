//! Server state - shared handles for all services
//!
//! `ServerState` is cheap to clone (everything behind `Arc`) and is handed
//! to every request handler via axum's state extractor.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::notes::{NoteStorage, NotesManager, NotesSyncService, RemoteStore, SaveWorker};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    /// Working-note owner
    pub notes: NotesManager,
    /// Remote notes store client, when configured
    pub remote: Option<Arc<NotesSyncService>>,
    shutdown: CancellationToken,
    save_worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ServerState {
    /// Open the local store, restore the working note from the previous run
    /// and start the background save worker.
    pub fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .map_err(|e| AppError::internal(format!("Failed to create work dir: {e}")))?;

        let storage = NoteStorage::open(config.db_path())?;
        let (notes, save_rx) = NotesManager::new(storage);

        if let Err(e) = notes.restore() {
            // the note is re-importable by re-scanning; keep the server up
            tracing::warn!("Failed to restore working note: {e}");
        }

        let shutdown = CancellationToken::new();
        let worker = SaveWorker::new(
            notes.clone(),
            save_rx,
            Duration::from_millis(config.save_debounce_ms),
            shutdown.clone(),
        );
        let save_worker = Arc::new(Mutex::new(Some(tokio::spawn(worker.run()))));

        let remote = match &config.remote_notes_url {
            Some(url) => Some(Arc::new(NotesSyncService::new(url.clone())?)),
            None => {
                tracing::warn!("REMOTE_NOTES_URL not set; remote save disabled");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config.clone()),
            notes,
            remote,
            shutdown,
            save_worker,
        })
    }

    /// The remote store handle, or a validation error when remote save is
    /// not configured.
    pub fn remote_store(&self) -> AppResult<Arc<dyn RemoteStore>> {
        self.remote
            .clone()
            .map(|r| r as Arc<dyn RemoteStore>)
            .ok_or_else(|| AppError::validation("Remote save is not configured"))
    }

    /// Stop the save worker and wait for its final flush.
    pub async fn shutdown_and_flush(&self) {
        self.shutdown.cancel();
        let handle = self.save_worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("Save worker did not shut down cleanly: {e}");
            }
        }
    }
}
