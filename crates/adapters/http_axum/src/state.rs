//! Shared application state for axum handlers.

use std::sync::Arc;

use owlhub_app::event_bus::EventFanout;

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Fan-out hub the ingestion pipeline publishes into.
    pub events: Arc<EventFanout>,
}

impl AppState {
    /// Create a new application state around a shared fan-out.
    #[must_use]
    pub fn new(events: Arc<EventFanout>) -> Self {
        Self { events }
    }
}
