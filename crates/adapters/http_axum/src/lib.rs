//! # owlhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the current [`Snapshot`](owlhub_app::event_bus::Snapshot) as JSON
//!   (`/api/snapshot`) so late joiners can render the latest reading and
//!   the active alert
//! - Stream live telemetry and alert events over Server-Sent Events
//!   (`/api/events/stream`); every open stream is one fan-out subscriber
//!
//! ## Dependency rule
//! Depends on `owlhub-app` (for the event fan-out) and `owlhub-domain`
//! (for event types). Never leaks axum types into the domain.

pub mod api;
pub mod router;
pub mod state;
