//! Transport port: the byte-stream link to the sensor device.
//!
//! A [`Transport`] knows how to enumerate endpoints and open one of them.
//! The resulting [`Connection`] yields newline-delimited records and accepts
//! single-byte commands. Baud rate and framing are fixed adapter
//! configuration, never negotiated through this port.

use std::future::Future;

use owlhub_domain::device::DeviceCandidate;
use owlhub_domain::error::OwlHubError;

/// Discovers and opens device endpoints.
pub trait Transport: Send + Sync {
    /// An open session on one endpoint.
    type Connection: Connection;

    /// Enumerate the endpoints currently visible to the host.
    fn discover(&self)
    -> impl Future<Output = Result<Vec<DeviceCandidate>, OwlHubError>> + Send;

    /// Open `candidate`.
    ///
    /// Fails with [`OwlHubError::Connect`] when the endpoint cannot be opened.
    fn open(
        &self,
        candidate: &DeviceCandidate,
    ) -> impl Future<Output = Result<Self::Connection, OwlHubError>> + Send;
}

/// An open session producing raw lines.
///
/// The line sequence is infinite while the session is healthy and cannot be
/// restarted once closed: after `Ok(None)` or an error, open a new session.
/// Dropping the connection closes the underlying transport.
pub trait Connection: Send {
    /// Wait for the next raw line, without its terminator.
    ///
    /// Returns `Ok(None)` once the transport has closed.
    fn next_line(&mut self) -> impl Future<Output = Result<Option<String>, OwlHubError>> + Send;

    /// Write raw bytes to the device without waiting on the device.
    ///
    /// # Errors
    ///
    /// Returns [`OwlHubError::TransportFault`] when the write fails.
    fn write(&mut self, bytes: &[u8]) -> Result<(), OwlHubError>;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    type Connection = T::Connection;

    fn discover(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceCandidate>, OwlHubError>> + Send {
        (**self).discover()
    }

    fn open(
        &self,
        candidate: &DeviceCandidate,
    ) -> impl Future<Output = Result<Self::Connection, OwlHubError>> + Send {
        (**self).open(candidate)
    }
}
