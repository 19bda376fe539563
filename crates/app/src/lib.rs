//! # owlhub-app
//!
//! Application layer: the ingestion-and-control loop and its **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Transport` / `Connection`: discover, open, read lines, write commands
//!   - `AnomalyAnalyzer`: forward a reading to the analysis collaborator
//!   - `EventPublisher`: deliver events to subscribers
//! - Provide the core components:
//!   - `decoder`: multi-format line decoding
//!   - `calibrator`: fixed temperature offset
//!   - `automation`: humidity/motion actuator rule
//!   - `connector`: device selection, retry state machine, single-flight connect
//!   - `anomaly_gateway`: fire-and-forget analysis with alert expiry
//!   - `event_bus`: subscriber registry and best-effort fan-out
//!   - `pipeline`: the single ingestion loop tying them together
//!
//! ## Dependency rule
//! Depends on `owlhub-domain` only (plus `tokio` for tasks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod anomaly_gateway;
pub mod automation;
pub mod calibrator;
pub mod connector;
pub mod decoder;
pub mod event_bus;
pub mod pipeline;
pub mod ports;
