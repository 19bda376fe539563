//! Latest reading and active alert.

use axum::Json;
use axum::extract::State;

use owlhub_app::event_bus::Snapshot;

use crate::state::AppState;

/// `GET /api/snapshot`: latest calibrated reading and the active alert, if any.
pub async fn get(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.events.snapshot())
}
