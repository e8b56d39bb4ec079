//! NotesManager - owns the working note and its per-item edit sessions
//!
//! # Edit Flow
//!
//! ```text
//! edit_item(index, edit)
//!     ├─ 1. Locate the item's edit session
//!     ├─ 2. Apply the edit (discount sync + pricing recompute)
//!     ├─ 3. Merge the emitted patch into the note by index
//!     ├─ 4. Mark the note as having unsaved remote changes
//!     ├─ 5. Signal the save worker (debounced local write)
//!     └─ 6. Return the updated item, its pricing and the patch
//! ```
//!
//! The local write is decoupled through the save-signal channel; the remote
//! save is explicit, user-triggered and at most one in flight.

use parking_lot::RwLock;
use shared::models::item::{Item, ItemPatch};
use shared::models::note::{Note, ScrapData};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::session::{ItemEdit, ItemEditSession};
use super::storage::{NoteStorage, StorageResult};
use super::sync::RemoteStore;
use crate::pricing::ItemPricing;
use crate::utils::{AppError, AppResult};

/// Result of one applied edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub item: Item,
    pub pricing: ItemPricing,
    pub patch: ItemPatch,
}

/// The note currently being worked on
struct OpenNote {
    note: Note,
    /// One session per item, index-aligned with `note.items`
    sessions: Vec<ItemEditSession>,
    /// Set on every edit, cleared by a successful remote save
    unsaved_remote: bool,
}

impl OpenNote {
    fn new(note: Note, unsaved_remote: bool) -> Self {
        let sessions = note.items.iter().cloned().map(ItemEditSession::new).collect();
        Self {
            note,
            sessions,
            unsaved_remote,
        }
    }
}

struct ManagerInner {
    current: Option<OpenNote>,
}

/// Working-note owner. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct NotesManager {
    storage: NoteStorage,
    inner: Arc<RwLock<ManagerInner>>,
    save_tx: mpsc::UnboundedSender<()>,
    remote_in_flight: Arc<AtomicBool>,
    flushed_saves: Arc<AtomicU64>,
}

impl NotesManager {
    /// Create a manager plus the receiving end of its save-signal channel
    /// (handed to the save worker).
    pub fn new(storage: NoteStorage) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (save_tx, save_rx) = mpsc::unbounded_channel();
        let manager = Self {
            storage,
            inner: Arc::new(RwLock::new(ManagerInner { current: None })),
            save_tx,
            remote_in_flight: Arc::new(AtomicBool::new(false)),
            flushed_saves: Arc::new(AtomicU64::new(0)),
        };
        (manager, save_rx)
    }

    /// Reload the working note persisted by a previous run, if any.
    pub fn restore(&self) -> AppResult<Option<Note>> {
        let note = self.storage.current_note()?;
        if let Some(note) = note.clone() {
            tracing::info!(url = %note.url, items = note.items.len(), "Restored working note");
            // remote state of a restored note is unknown; keep it flagged
            self.inner.write().current = Some(OpenNote::new(note, true));
        }
        Ok(note)
    }

    /// Turn a scraped receipt into the working note, pricing fields
    /// defaulted. A re-scan of an already-stored url supersedes that record
    /// on the next flush.
    pub fn import_scrap(&self, url: &str, scrap: &ScrapData) -> AppResult<Note> {
        if url.trim().is_empty() {
            return Err(AppError::validation("Scanned url must not be empty"));
        }

        let note = Note::from_scrap(url, scrap);
        tracing::info!(url = %note.url, items = note.items.len(), "Imported scraped receipt");

        self.inner.write().current = Some(OpenNote::new(note.clone(), true));
        self.schedule_save();
        Ok(note)
    }

    /// Re-open a stored note as the working note.
    pub fn open_saved(&self, url: &str) -> AppResult<Note> {
        let note = self
            .storage
            .get_note(url)?
            .ok_or_else(|| AppError::not_found(format!("Note not found: {url}")))?;

        tracing::info!(url = %url, "Opened stored note");
        self.inner.write().current = Some(OpenNote::new(note.clone(), true));
        self.schedule_save();
        Ok(note)
    }

    /// The working note, if one is open.
    pub fn current(&self) -> Option<Note> {
        self.inner.read().current.as_ref().map(|o| o.note.clone())
    }

    /// The working note plus the derived pricing of every item.
    pub fn current_with_pricing(&self) -> Option<(Note, Vec<ItemPricing>)> {
        let inner = self.inner.read();
        inner.current.as_ref().map(|o| {
            let pricing = o.sessions.iter().map(|s| s.pricing()).collect();
            (o.note.clone(), pricing)
        })
    }

    /// Whether the working note has edits not yet saved remotely.
    pub fn has_unsaved_remote_changes(&self) -> bool {
        self.inner
            .read()
            .current
            .as_ref()
            .is_some_and(|o| o.unsaved_remote)
    }

    /// Apply one edit operation to the item at `index`.
    ///
    /// An edit the session rejects (empty patch) changes nothing and
    /// schedules nothing.
    pub fn edit_item(&self, index: usize, edit: &ItemEdit) -> AppResult<EditOutcome> {
        let outcome = {
            let mut inner = self.inner.write();
            let open = inner
                .current
                .as_mut()
                .ok_or_else(|| AppError::not_found("No note is currently open"))?;

            let session = open
                .sessions
                .get_mut(index)
                .ok_or_else(|| AppError::not_found(format!("Item index {index} out of range")))?;

            let patch = session.apply(edit);
            let item = session.item().clone();
            let pricing = session.pricing();

            if !patch.is_empty() {
                open.note.items[index].apply_patch(&patch);
                open.unsaved_remote = true;
            }

            EditOutcome {
                item,
                pricing,
                patch,
            }
        };

        if !outcome.patch.is_empty() {
            self.schedule_save();
        }
        Ok(outcome)
    }

    /// All stored notes, ordered by receipt date (unparseable dates first).
    pub fn list_notes(&self) -> AppResult<Vec<Note>> {
        let mut notes = self.storage.list_notes()?;
        notes.sort_by_key(|n| n.parsed_date());
        Ok(notes)
    }

    /// Push the working note to the remote store.
    ///
    /// At most one remote save is in flight; a concurrent call fails with a
    /// conflict. Failure leaves the unsaved flag set so the user can retry;
    /// it never rolls back local state.
    pub async fn save_remote(&self, remote: Arc<dyn RemoteStore>) -> AppResult<()> {
        let note = self
            .current()
            .ok_or_else(|| AppError::not_found("No note is currently open"))?;

        if self.remote_in_flight.swap(true, Ordering::SeqCst) {
            return Err(AppError::conflict("A remote save is already in flight"));
        }

        let result = remote.upsert_note(&note).await;
        self.remote_in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                if let Some(open) = self.inner.write().current.as_mut() {
                    open.unsaved_remote = false;
                }
                tracing::info!(url = %note.url, "Note saved to remote store");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %note.url, error = %e, "Remote save failed; local state remains the source of truth");
                Err(e)
            }
        }
    }

    /// Persist the working note locally (called by the save worker after the
    /// debounce window). Returns false when nothing is open.
    pub(crate) fn flush_working_note(&self) -> StorageResult<bool> {
        let note = self.inner.read().current.as_ref().map(|o| o.note.clone());

        match note {
            Some(note) => {
                self.storage.persist_working_note(&note)?;
                self.flushed_saves.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %note.url, "Working note persisted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of local writes performed so far.
    pub fn flushed_saves(&self) -> u64 {
        self.flushed_saves.load(Ordering::Relaxed)
    }

    fn schedule_save(&self) {
        if self.save_tx.send(()).is_err() {
            tracing::warn!("Save worker unavailable; local persistence postponed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::models::note::ScrapItem;
    use std::sync::atomic::AtomicU64;
    use tokio::sync::Semaphore;

    fn scrap_data() -> ScrapData {
        ScrapData {
            items: vec![
                ScrapItem {
                    name: "Arroz".to_string(),
                    units: 10,
                    price: 100.0,
                },
                ScrapItem {
                    name: "Feijão".to_string(),
                    units: 1,
                    price: 8.50,
                },
            ],
            name: "Mercado Central".to_string(),
            date: "05/08/2026".to_string(),
            total_price: "108,50".to_string(),
        }
    }

    fn make_manager() -> (NotesManager, mpsc::UnboundedReceiver<()>) {
        NotesManager::new(NoteStorage::open_in_memory().unwrap())
    }

    /// Remote fake that blocks until released and counts calls.
    struct GatedRemote {
        gate: Semaphore,
        calls: AtomicU64,
    }

    #[async_trait]
    impl RemoteStore for GatedRemote {
        async fn upsert_note(&self, _note: &Note) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.map_err(|e| AppError::internal(e.to_string()))?;
            Ok(())
        }
    }

    struct FailingRemote;

    #[async_trait]
    impl RemoteStore for FailingRemote {
        async fn upsert_note(&self, _note: &Note) -> Result<(), AppError> {
            Err(AppError::remote("remote store unavailable"))
        }
    }

    #[test]
    fn test_import_creates_working_note_and_signals_save() {
        let (manager, mut rx) = make_manager();

        let note = manager.import_scrap("url-1", &scrap_data()).unwrap();

        assert_eq!(note.items.len(), 2);
        assert_eq!(manager.current().unwrap(), note);
        assert!(manager.has_unsaved_remote_changes());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_import_rejects_empty_url() {
        let (manager, _rx) = make_manager();
        let result = manager.import_scrap("  ", &scrap_data());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_edit_merges_patch_into_note() {
        let (manager, mut rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();
        while rx.try_recv().is_ok() {}

        let outcome = manager
            .edit_item(0, &ItemEdit::SetDiscount { cents: 1000 })
            .unwrap();

        assert_eq!(outcome.patch.discount, Some(10.0));
        let note = manager.current().unwrap();
        assert_eq!(note.items[0].discount, 10.0);
        assert!((note.items[0].discount_perc - 10.0).abs() < 1e-9);
        // the session copy and the note copy stay identical
        assert_eq!(note.items[0], outcome.item);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_rejected_edit_schedules_nothing() {
        let (manager, mut rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();
        manager.edit_item(0, &ItemEdit::ToggleCustomFinalPrice).unwrap();
        while rx.try_recv().is_ok() {}

        let outcome = manager
            .edit_item(0, &ItemEdit::SetProfitMargin { percent: 90.0 })
            .unwrap();

        assert!(outcome.patch.is_empty());
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.current().unwrap().items[0].profit_margin, 30.0);
    }

    #[test]
    fn test_edit_without_open_note_fails() {
        let (manager, _rx) = make_manager();
        let result = manager.edit_item(0, &ItemEdit::SetPrice { cents: 100 });
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_edit_index_out_of_range_fails() {
        let (manager, _rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();
        let result = manager.edit_item(9, &ItemEdit::SetPrice { cents: 100 });
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_flush_persists_and_restore_reloads() {
        let (manager, _rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();
        manager
            .edit_item(0, &ItemEdit::SetProfitMargin { percent: 45.0 })
            .unwrap();

        assert!(manager.flush_working_note().unwrap());
        assert_eq!(manager.flushed_saves(), 1);

        // a second manager over the same storage sees the persisted state
        let (restored, _rx2) = NotesManager::new(manager.storage.clone());
        let note = restored.restore().unwrap().unwrap();
        assert_eq!(note.url, "url-1");
        assert_eq!(note.items[0].profit_margin, 45.0);
        assert_eq!(restored.current().unwrap(), note);
    }

    #[test]
    fn test_flush_with_nothing_open_is_a_noop() {
        let (manager, _rx) = make_manager();
        assert!(!manager.flush_working_note().unwrap());
        assert_eq!(manager.flushed_saves(), 0);
    }

    #[test]
    fn test_open_saved_requires_stored_note() {
        let (manager, _rx) = make_manager();
        assert!(matches!(
            manager.open_saved("missing"),
            Err(AppError::NotFound(_))
        ));

        manager.import_scrap("url-1", &scrap_data()).unwrap();
        manager.flush_working_note().unwrap();

        let note = manager.open_saved("url-1").unwrap();
        assert_eq!(note.url, "url-1");
    }

    #[test]
    fn test_list_notes_sorted_by_receipt_date() {
        let (manager, _rx) = make_manager();

        for (url, date) in [
            ("url-a", "02/01/2026"),
            ("url-b", "31/12/2025"),
            ("url-c", "15/07/2026"),
        ] {
            let mut scrap = scrap_data();
            scrap.date = date.to_string();
            manager.import_scrap(url, &scrap).unwrap();
            manager.flush_working_note().unwrap();
        }

        let notes = manager.list_notes().unwrap();
        let dates: Vec<&str> = notes.iter().map(|n| n.date.as_str()).collect();
        assert_eq!(dates, vec!["31/12/2025", "02/01/2026", "15/07/2026"]);
    }

    #[tokio::test]
    async fn test_remote_save_success_clears_unsaved_flag() {
        let (manager, _rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();
        assert!(manager.has_unsaved_remote_changes());

        let remote = Arc::new(GatedRemote {
            gate: Semaphore::new(1),
            calls: AtomicU64::new(0),
        });
        manager.save_remote(remote.clone()).await.unwrap();

        assert!(!manager.has_unsaved_remote_changes());
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_save_failure_keeps_unsaved_flag() {
        let (manager, _rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();

        let result = manager.save_remote(Arc::new(FailingRemote)).await;

        assert!(matches!(result, Err(AppError::Remote(_))));
        assert!(manager.has_unsaved_remote_changes());
    }

    #[tokio::test]
    async fn test_remote_save_is_at_most_one_in_flight() {
        let (manager, _rx) = make_manager();
        manager.import_scrap("url-1", &scrap_data()).unwrap();

        let remote = Arc::new(GatedRemote {
            gate: Semaphore::new(0),
            calls: AtomicU64::new(0),
        });

        let first = tokio::spawn({
            let manager = manager.clone();
            let remote = remote.clone();
            async move { manager.save_remote(remote).await }
        });

        // wait until the first save is inside the remote call
        while remote.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = manager.save_remote(remote.clone()).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert!(manager.has_unsaved_remote_changes());

        remote.gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert!(!manager.has_unsaved_remote_changes());
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_save_without_open_note_fails() {
        let (manager, _rx) = make_manager();
        let remote = Arc::new(FailingRemote);
        let result = manager.save_remote(remote).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
