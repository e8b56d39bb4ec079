//! HTTP API
//!
//! The surface the mobile shell talks to. Routers are grouped per resource;
//! errors render as the coded [`AppResponse`](crate::utils::AppResponse)
//! envelope.

pub mod health;
pub mod notes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notes::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
