//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/nota-server | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | REMOTE_NOTES_URL | (unset) | Base URL of the remote notes store |
//! | SAVE_DEBOUNCE_MS | 1000 | Quiet period before a local write |
//! | ENVIRONMENT | development | development \| staging \| production |
//!
//! # Example
//!
//! ```ignore
//! WORK_DIR=/data/nota HTTP_PORT=8080 cargo run
//! ```

use std::path::PathBuf;

use crate::notes::save_worker::DEFAULT_SAVE_DEBOUNCE_MS;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the note database
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Base URL of the remote notes store; remote save is disabled when unset
    pub remote_notes_url: Option<String>,
    /// Quiet period (milliseconds) the save worker waits after the last edit
    pub save_debounce_ms: u64,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/nota-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            remote_notes_url: std::env::var("REMOTE_NOTES_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            save_debounce_ms: std::env::var("SAVE_DEBOUNCE_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SAVE_DEBOUNCE_MS),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the locations that matter for test setups.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the embedded note database
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("notes.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
