//! Connection state machine for the device transport.
//!
//! The connector owns exactly one [`ConnectionState`] and advances it only
//! through [`ConnectionState::transition`]. Other components never see the
//! state itself; they can only observe [`ConnectionStatus`] notifications for
//! the `Connected` and `Faulted` transitions.

use serde::{Deserialize, Serialize};

use crate::error::InvalidTransitionError;

/// Lifecycle state of the device connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Looking for a device; discovery runs (again) after the backoff.
    #[default]
    Searching,
    /// A candidate was selected and is being opened.
    Connecting,
    /// The transport is open and producing lines.
    Connected,
    /// The last open attempt or session failed; waiting for the backoff.
    Faulted,
}

/// Inputs that drive the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorEvent {
    /// Discovery selected a candidate.
    CandidateSelected,
    /// Discovery returned nothing usable.
    NothingFound,
    /// The selected candidate was opened.
    Opened,
    /// Opening the selected candidate failed.
    OpenFailed,
    /// An I/O error ended the session.
    Fault,
    /// The retry backoff elapsed.
    BackoffElapsed,
}

impl ConnectionState {
    /// Compute the next state for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransitionError`] when `event` cannot happen in the
    /// current state (e.g. a fault while still searching).
    pub fn transition(self, event: ConnectorEvent) -> Result<Self, InvalidTransitionError> {
        use ConnectorEvent as E;

        match (self, event) {
            (Self::Searching, E::CandidateSelected) => Ok(Self::Connecting),
            (Self::Searching, E::NothingFound) => Ok(Self::Searching),
            (Self::Connecting, E::Opened) => Ok(Self::Connected),
            (Self::Connecting, E::OpenFailed) | (Self::Connected, E::Fault) => Ok(Self::Faulted),
            (Self::Faulted, E::BackoffElapsed) => Ok(Self::Searching),
            (from, event) => Err(InvalidTransitionError { from, event }),
        }
    }

    /// Whether a session is currently established.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Searching => f.write_str("searching"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Faulted => f.write_str("faulted"),
        }
    }
}

/// Externally observable connection transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// A session was established on `path`.
    Connected { path: String },
    /// The open attempt or the session on `path` failed.
    Faulted { path: String, reason: String },
}
