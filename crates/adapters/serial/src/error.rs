//! Serial adapter error types.

use owlhub_domain::error::OwlHubError;

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// Listing the host's serial ports failed.
    #[error("failed to enumerate serial ports")]
    Enumerate(#[source] serialport::Error),

    /// The port could not be opened or configured.
    #[error("failed to open serial port {path}")]
    Open {
        /// Port that was being opened.
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// The reader thread could not be started.
    #[error("failed to start reader for {path}")]
    Reader {
        /// Port whose reader failed to start.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to an open port failed.
    #[error("serial I/O error")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Convert into the matching [`OwlHubError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> OwlHubError {
        match self {
            Self::Open { path, source } => OwlHubError::Connect {
                path,
                source: Box::new(source),
            },
            Self::Reader { ref path, .. } => OwlHubError::Connect {
                path: path.clone(),
                source: Box::new(self),
            },
            other => OwlHubError::TransportFault(Box::new(other)),
        }
    }
}

impl From<SerialError> for OwlHubError {
    fn from(err: SerialError) -> Self {
        err.into_domain()
    }
}
