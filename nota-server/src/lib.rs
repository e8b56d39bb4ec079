//! Nota Server - headless pricing core for the receipt-scanner app
//!
//! The mobile shell scans an NFC-e QR code and scrapes the receipt page;
//! this service owns everything after that:
//!
//! - **Pricing** (`pricing`): derives unit/discounted/final/rounded prices
//! - **Notes** (`notes`): edit sessions, local persistence, remote sync
//! - **HTTP API** (`api`): the surface the shell talks to
//!
//! # Module Structure
//!
//! ```text
//! nota-server/src/
//! ├── core/          # Configuration, server state
//! ├── pricing/       # Pure price derivation
//! ├── notes/         # Sessions, manager, storage, save worker, sync
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod core;
pub mod notes;
pub mod pricing;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, ServerState};
pub use notes::{
    EditOutcome, ItemEdit, ItemEditSession, NoteStorage, NotesManager, NotesSyncService,
    RemoteStore, SaveWorker,
};
pub use pricing::{ItemPricing, calculate_item_pricing, round_to_step};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
