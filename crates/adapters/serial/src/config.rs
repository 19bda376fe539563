//! Serial transport configuration.

use std::time::Duration;

use serde::Deserialize;

use owlhub_app::connector::{DEFAULT_RETRY_BACKOFF, SelectionPolicy};

/// Configuration for the serial transport and device selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Fixed device path. When set, discovery only accepts this endpoint.
    pub path: Option<String>,
    /// Line speed; framing is always 8N1.
    pub baud_rate: u32,
    /// How long a blocking read waits before checking for shutdown, in milliseconds.
    pub read_timeout_ms: u64,
    /// Substrings of USB manufacturer strings that identify the sensor board.
    pub vendor_signatures: Vec<String>,
    /// Path token of USB serial adapters.
    pub usb_token: String,
    /// Path token of generic serial ports.
    pub generic_port_token: String,
    /// Delay between discovery attempts and after a fault, in seconds.
    pub retry_backoff_secs: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let policy = SelectionPolicy::default();
        Self {
            path: None,
            baud_rate: 9600,
            read_timeout_ms: 1000,
            vendor_signatures: policy.vendor_signatures,
            usb_token: policy.usb_token,
            generic_port_token: policy.generic_port_token,
            retry_backoff_secs: DEFAULT_RETRY_BACKOFF.as_secs(),
        }
    }
}

impl SerialConfig {
    /// Device selection rules described by this configuration.
    #[must_use]
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            vendor_signatures: self.vendor_signatures.clone(),
            usb_token: self.usb_token.clone(),
            generic_port_token: self.generic_port_token.clone(),
            fixed_path: self.path.clone(),
        }
    }

    /// Delay between connection attempts.
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    /// Blocking read timeout of the opened port.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
