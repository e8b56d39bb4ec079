//! redb-based storage for note records
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `notes` | `url` | `Note` (JSON) | Saved notes, upsert keyed by source URL |
//! | `state` | `"current_url"` | url | Pointer to the note being worked on |
//!
//! Inserting under an existing url overwrites the record in place: a
//! re-scan of the same receipt supersedes the stored note. redb commits are
//! durable as soon as `commit()` returns, so a working note survives app
//! restarts once the save worker has flushed it.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::note::Note;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for note records: key = source url, value = JSON-serialized Note
const NOTES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("notes");

/// Table for working state: key = "current_url", value = url of the open note
const STATE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("state");

const CURRENT_URL_KEY: &str = "current_url";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Note storage backed by redb
#[derive(Clone)]
pub struct NoteStorage {
    db: Arc<Database>,
}

impl NoteStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NOTES_TABLE)?;
            let _ = write_txn.open_table(STATE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NOTES_TABLE)?;
            let _ = write_txn.open_table(STATE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Note Records ==========

    /// Insert or replace the record stored under `note.url`
    pub fn upsert_note(&self, note: &Note) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(NOTES_TABLE)?;
            let value = serde_json::to_vec(note)?;
            table.insert(note.url.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get a note by its source url
    pub fn get_note(&self, url: &str) -> StorageResult<Option<Note>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTES_TABLE)?;

        match table.get(url)? {
            Some(value) => {
                let note: Note = serde_json::from_slice(value.value())?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    /// Get all stored notes (iteration order is by url; callers sort)
    pub fn list_notes(&self) -> StorageResult<Vec<Note>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTES_TABLE)?;

        let mut notes = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let note: Note = serde_json::from_slice(value.value())?;
            notes.push(note);
        }

        Ok(notes)
    }

    // ========== Working Note ==========

    /// Persist the working note and point the current-note slot at it,
    /// atomically. This is the single write the save worker performs per
    /// quiet period.
    pub fn persist_working_note(&self, note: &Note) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut notes = txn.open_table(NOTES_TABLE)?;
            let value = serde_json::to_vec(note)?;
            notes.insert(note.url.as_str(), value.as_slice())?;

            let mut state = txn.open_table(STATE_TABLE)?;
            state.insert(CURRENT_URL_KEY, note.url.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Url of the note that was being worked on, if any
    pub fn current_url(&self) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATE_TABLE)?;
        Ok(table.get(CURRENT_URL_KEY)?.map(|g| g.value().to_string()))
    }

    /// Load the working note via the current-note pointer
    pub fn current_note(&self) -> StorageResult<Option<Note>> {
        match self.current_url()? {
            Some(url) => self.get_note(&url),
            None => Ok(None),
        }
    }
}
