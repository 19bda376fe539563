//! # owlhub-adapter-serial
//!
//! Serial transport for the sensor board.
//!
//! ## How it works
//!
//! Discovery lists the host's serial ports through [`serialport`] and keeps
//! the USB manufacturer string as the candidate's hint. Opening a port
//! clones its handle: one copy is moved to a dedicated reader thread that
//! splits the byte stream into lines and forwards them over a tokio channel,
//! the other stays with the connection for single-byte command writes.
//!
//! The port is opened at a fixed baud rate, 8N1, no flow control. Records are
//! terminated by `\r\n`.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `owlhub-app` and `owlhub-domain`.

mod config;
mod connection;
mod error;

pub use config::SerialConfig;
pub use connection::SerialConnection;
pub use error::SerialError;

use std::time::Duration;

use serialport::{SerialPortInfo, SerialPortType};

use owlhub_app::ports::Transport;
use owlhub_domain::device::DeviceCandidate;
use owlhub_domain::error::OwlHubError;

/// [`Transport`] over the host's serial ports.
#[derive(Debug, Clone)]
pub struct SerialTransport {
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Create a transport with the port settings from `config`.
    #[must_use]
    pub fn new(config: &SerialConfig) -> Self {
        Self {
            baud_rate: config.baud_rate,
            read_timeout: config.read_timeout(),
        }
    }
}

impl Transport for SerialTransport {
    type Connection = SerialConnection;

    async fn discover(&self) -> Result<Vec<DeviceCandidate>, OwlHubError> {
        let ports = tokio::task::spawn_blocking(serialport::available_ports)
            .await
            .map_err(|err| OwlHubError::TransportFault(Box::new(err)))?
            .map_err(SerialError::Enumerate)?;

        let candidates: Vec<_> = ports.into_iter().map(candidate_from_port).collect();
        tracing::debug!(count = candidates.len(), "serial ports enumerated");
        Ok(candidates)
    }

    async fn open(&self, candidate: &DeviceCandidate) -> Result<SerialConnection, OwlHubError> {
        let path = candidate.path.clone();
        let baud_rate = self.baud_rate;
        let read_timeout = self.read_timeout;

        let connection = tokio::task::spawn_blocking(move || {
            SerialConnection::open(&path, baud_rate, read_timeout)
        })
        .await
        .map_err(|err| OwlHubError::Connect {
            path: candidate.path.clone(),
            source: Box::new(err),
        })??;

        tracing::debug!(path = %candidate.path, baud_rate, "serial port opened");
        Ok(connection)
    }
}

/// Map one enumerated port to a selection candidate.
///
/// Only USB ports carry a manufacturer string.
fn candidate_from_port(port: SerialPortInfo) -> DeviceCandidate {
    let candidate = DeviceCandidate::new(port.port_name);
    match port.port_type {
        SerialPortType::UsbPort(info) => match info.manufacturer {
            Some(manufacturer) => candidate.with_manufacturer(manufacturer),
            None => candidate,
        },
        _ => candidate,
    }
}
