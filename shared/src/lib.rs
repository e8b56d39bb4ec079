//! Shared types for the nota resale-pricing service
//!
//! Holds the wire/storage models exchanged between the mobile shell, the
//! local store and the remote notes store, plus the currency/number helpers
//! both sides of that boundary rely on.

pub mod models;
pub mod util;

pub use models::item::{Item, ItemPatch, RoundingDirection};
pub use models::note::{Note, ScrapData, ScrapItem};
