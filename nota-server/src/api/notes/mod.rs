//! Notes API module
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/notes | GET | List stored notes, ordered by receipt date |
//! | /api/notes/import | POST | Scraped payload + url → working note |
//! | /api/notes/open | POST | Re-open a stored note by url |
//! | /api/notes/current | GET | Working note with pricing |
//! | /api/notes/current/items/{index}/edits | POST | Apply one edit |
//! | /api/notes/current/save-remote | POST | Push the note to the remote store |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notes", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/import", post(handler::import))
        .route("/open", post(handler::open))
        .route("/current", get(handler::current))
        .route("/current/items/{index}/edits", post(handler::edit_item))
        .route("/current/save-remote", post(handler::save_remote))
}
