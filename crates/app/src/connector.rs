//! Transport connector: device selection, connection lifecycle and retry.
//!
//! [`Connector`] is the single owner of the [`ConnectionState`]. Every
//! method that moves the state machine takes `&mut self`, so there is exactly
//! one writer and discovery/connect cycles cannot overlap: a second cycle can
//! only start once the previous one has returned.
//!
//! The device selection tiers are heuristics inherited from field use, not a
//! hardware contract:
//!
//! 1. a manufacturer hint matching a known microcontroller vendor
//! 2. a path containing a USB-style token
//! 3. the first path following the generic serial-port naming convention
//!
//! When nothing matches, the connector stays in `Searching` and retries after
//! the fixed backoff, forever.

use std::time::Duration;

use tokio::sync::broadcast;

use owlhub_domain::connection::{ConnectionState, ConnectionStatus, ConnectorEvent};
use owlhub_domain::device::DeviceCandidate;
use owlhub_domain::error::OwlHubError;

use crate::ports::Transport;

/// Delay between discovery attempts and after a fault.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(3);

const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Rules used to pick one endpoint out of a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Substrings identifying microcontroller vendors in manufacturer hints.
    pub vendor_signatures: Vec<String>,
    /// Path token identifying USB serial adapters.
    pub usb_token: String,
    /// Path token of the generic serial-port naming convention.
    pub generic_port_token: String,
    /// When set, only this exact path is accepted.
    pub fixed_path: Option<String>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            vendor_signatures: vec![
                "Arduino".to_string(),
                "Silicon Labs".to_string(),
                "wch.cn".to_string(),
            ],
            usb_token: "USB".to_string(),
            generic_port_token: "COM".to_string(),
            fixed_path: None,
        }
    }
}

impl SelectionPolicy {
    /// Pick the best candidate, or `None` when no tier matches.
    #[must_use]
    pub fn select<'a>(&self, candidates: &'a [DeviceCandidate]) -> Option<&'a DeviceCandidate> {
        if let Some(path) = &self.fixed_path {
            return candidates.iter().find(|c| &c.path == path);
        }

        candidates
            .iter()
            .find(|c| c.matches_vendor(&self.vendor_signatures))
            .or_else(|| candidates.iter().find(|c| c.path_contains(&self.usb_token)))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|c| c.path_contains(&self.generic_port_token))
            })
    }
}

/// Owns the device transport and its connection state.
pub struct Connector<T> {
    transport: T,
    policy: SelectionPolicy,
    backoff: Duration,
    state: ConnectionState,
    current_path: Option<String>,
    status_tx: broadcast::Sender<ConnectionStatus>,
}

impl<T: Transport> Connector<T> {
    /// Create a connector in the `Searching` state.
    pub fn new(transport: T, policy: SelectionPolicy, backoff: Duration) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            transport,
            policy,
            backoff,
            state: ConnectionState::default(),
            current_path: None,
            status_tx,
        }
    }

    /// Subscribe to `Connected` / `Faulted` transitions.
    #[must_use]
    pub fn watch_status(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Enumerate the endpoints currently visible.
    ///
    /// # Errors
    ///
    /// Propagates the transport's enumeration error.
    pub async fn discover(&self) -> Result<Vec<DeviceCandidate>, OwlHubError> {
        self.transport.discover().await
    }

    /// Open `candidate`, moving through `Connecting` to `Connected` or `Faulted`.
    ///
    /// # Errors
    ///
    /// Returns [`OwlHubError::Connect`] (or whatever the transport reports)
    /// when the endpoint cannot be opened.
    pub async fn connect(
        &mut self,
        candidate: &DeviceCandidate,
    ) -> Result<T::Connection, OwlHubError> {
        self.advance(ConnectorEvent::CandidateSelected);
        self.current_path = Some(candidate.path.clone());
        tracing::info!(device = %candidate, "attempting to connect");

        match self.transport.open(candidate).await {
            Ok(connection) => {
                self.advance(ConnectorEvent::Opened);
                tracing::info!(path = %candidate.path, "device connected");
                let _ = self.status_tx.send(ConnectionStatus::Connected {
                    path: candidate.path.clone(),
                });
                Ok(connection)
            }
            Err(err) => {
                self.advance(ConnectorEvent::OpenFailed);
                self.notify_fault(&err);
                Err(err)
            }
        }
    }

    /// Run discovery/connect cycles until a session is established.
    ///
    /// Never gives up: an empty discovery, a failed enumeration or a failed
    /// open all wait for the backoff and start over.
    pub async fn establish(&mut self) -> T::Connection {
        loop {
            match self.attempt().await {
                Ok(connection) => return connection,
                Err(OwlHubError::DiscoveryEmpty) => {
                    tracing::info!(
                        retry_in_secs = self.backoff.as_secs(),
                        "no device found, waiting"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(_) => {
                    // Already reported by `notify_fault`.
                    tracing::debug!(retry_in_secs = self.backoff.as_secs(), "retrying after backoff");
                    self.wait_backoff().await;
                }
            }
        }
    }

    /// Record a fault on the established session and wait for the backoff.
    ///
    /// Once this returns the connector is `Searching` again and
    /// [`establish`](Self::establish) may be called.
    pub async fn report_fault(&mut self, err: &OwlHubError) {
        self.advance(ConnectorEvent::Fault);
        self.notify_fault(err);
        self.wait_backoff().await;
    }

    async fn attempt(&mut self) -> Result<T::Connection, OwlHubError> {
        let candidates = match self.discover().await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(%err, "device enumeration failed");
                Vec::new()
            }
        };
        tracing::debug!(count = candidates.len(), "discovery pass complete");

        let Some(candidate) = self.policy.select(&candidates).cloned() else {
            self.advance(ConnectorEvent::NothingFound);
            return Err(OwlHubError::DiscoveryEmpty);
        };

        self.connect(&candidate).await
    }

    async fn wait_backoff(&mut self) {
        tokio::time::sleep(self.backoff).await;
        self.advance(ConnectorEvent::BackoffElapsed);
    }

    fn notify_fault(&mut self, err: &OwlHubError) {
        let path = self.current_path.take().unwrap_or_default();
        tracing::warn!(%path, %err, "device connection faulted");
        let _ = self.status_tx.send(ConnectionStatus::Faulted {
            path,
            reason: error_chain(err),
        });
    }

    fn advance(&mut self, event: ConnectorEvent) {
        match self.state.transition(event) {
            Ok(next) => {
                tracing::trace!(from = %self.state, to = %next, "connection state changed");
                self.state = next;
            }
            Err(err) => tracing::error!(%err, "connection state machine rejected event"),
        }
    }
}

/// Render an error and its sources on one line.
fn error_chain(err: &OwlHubError) -> String {
    let mut rendered = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
