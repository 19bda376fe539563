//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::state::AppState;

/// `GET /api/events/stream`: SSE stream of telemetry and alert events.
///
/// Registers a fan-out subscriber for the lifetime of the connection and
/// sends each event as a JSON `data:` frame, tagged with its kind as the SSE
/// event name. The subscriber is pruned once the client disconnects, and the
/// stream ends when the fan-out is closed so graceful shutdown can finish.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let subscription = state.events.subscribe();
    tracing::debug!(subscriber = %subscription.id(), "SSE client connected");

    let event_stream =
        ReceiverStream::new(subscription.into_receiver()).filter_map(|event| {
            match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event.kind()).data(json))),
                Err(err) => {
                    tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
                    None
                }
            }
        });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
