//! JSON and streaming API handlers.

pub mod snapshot;
pub mod sse;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(snapshot::get))
        .route("/events/stream", get(sse::stream))
}
