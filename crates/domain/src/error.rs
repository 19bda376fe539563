//! Common error types used across the workspace.
//!
//! Nothing in the ingestion core is fatal: every variant resolves into a
//! retry, a degrade-and-continue, or a log-and-continue. A line that yields
//! no usable field is not an error at all; it decodes to an empty
//! [`Telemetry`](crate::telemetry::Telemetry).

use crate::connection::{ConnectionState, ConnectorEvent};

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum OwlHubError {
    /// Discovery returned no usable candidate device.
    #[error("no candidate device found")]
    DiscoveryEmpty,

    /// Opening the selected device failed.
    #[error("failed to open device {path}")]
    Connect {
        /// Transport path of the device that could not be opened.
        path: String,
        #[source]
        source: BoxError,
    },

    /// An I/O error happened while a session was established.
    #[error("transport fault")]
    TransportFault(#[source] BoxError),

    /// The analysis collaborator could not be reached.
    #[error("analysis endpoint unreachable")]
    AnalysisUnreachable,

    /// The analysis collaborator answered with something we cannot use.
    #[error("analysis protocol error")]
    AnalysisProtocol(#[source] BoxError),

    /// The connection state machine refused a transition.
    #[error("invalid connection transition")]
    InvalidTransition(#[from] InvalidTransitionError),
}

impl OwlHubError {
    /// Whether this error is an expected, silently tolerated condition.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AnalysisUnreachable | Self::DiscoveryEmpty)
    }
}

/// A connector event that makes no sense in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while {from}")]
pub struct InvalidTransitionError {
    /// State the machine was in.
    pub from: ConnectionState,
    /// Event that was rejected.
    pub event: ConnectorEvent,
}
