//! # owlhub-domain
//!
//! Pure domain model for the owlhub sensor ingestion core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define **Telemetry** (one decoded sensor snapshot, every field optional)
//! - Define **Device candidates** (transport endpoints found during discovery)
//! - Define the **connection state machine** (`Searching → Connecting → Connected → Faulted`)
//! - Define **Automation commands** (actuator on/off) and their wire bytes
//! - Define **Anomaly alerts** and the **Events** delivered to subscribers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod alert;
pub mod command;
pub mod connection;
pub mod device;
pub mod event;
pub mod telemetry;
