//! SaveWorker - debounced local persistence for the working note
//!
//! Listens on the manager's save-signal channel, debounces bursts of edits
//! (e.g. typing into a field) and performs exactly one local write per quiet
//! period, always with the latest state. A new edit inside the window
//! cancels and reschedules the pending write. Failed writes are logged and
//! retried on the next cycle; the state is still in memory, nothing is
//! lost. Shutdown performs a final flush.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::manager::NotesManager;

/// Default quiet period before a local write
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;

pub struct SaveWorker {
    manager: NotesManager,
    save_rx: mpsc::UnboundedReceiver<()>,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl SaveWorker {
    pub fn new(
        manager: NotesManager,
        save_rx: mpsc::UnboundedReceiver<()>,
        debounce: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            save_rx,
            debounce,
            shutdown,
        }
    }

    /// Run the save worker until shutdown or channel close.
    pub async fn run(mut self) {
        tracing::info!(debounce_ms = self.debounce.as_millis() as u64, "SaveWorker started");

        // Armed while a write is pending
        let mut deadline: Option<Instant> = None;

        loop {
            let sleep_until =
                deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SaveWorker shutting down");
                    self.flush();
                    break;
                }

                _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                    if self.flush() {
                        deadline = None;
                    } else {
                        // keep the write pending, retry after another window
                        deadline = Some(Instant::now() + self.debounce);
                    }
                }

                msg = self.save_rx.recv() => {
                    match msg {
                        Some(()) => {
                            deadline = Some(Instant::now() + self.debounce);
                        }
                        None => {
                            tracing::info!("Save channel closed, SaveWorker stopping");
                            self.flush();
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("SaveWorker stopped");
    }

    /// Persist the working note. Returns false when the write failed and
    /// should be retried.
    fn flush(&self) -> bool {
        match self.manager.flush_working_note() {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Failed to persist working note, retrying next cycle: {e}");
                false
            }
        }
    }
}
