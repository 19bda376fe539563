//! Anomaly alerts produced from the analysis collaborator's verdicts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OwlHubError;
use crate::id::AlertId;
use crate::time::{self, Timestamp};

/// How long an alert stays active before it is cleared.
pub const ALERT_TTL: Duration = Duration::from_secs(5);

/// Message used when a positive verdict carries none.
pub const DEFAULT_ALERT_MESSAGE: &str = "Unusual activity detected!";

/// An anomaly reported by the analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub id: AlertId,
    /// Human-readable description of the anomaly.
    pub message: String,
    /// Opaque response body, passed through untouched.
    pub details: Map<String, Value>,
    pub received_at: Timestamp,
}

impl AnomalyAlert {
    /// Create an alert received now.
    pub fn new(message: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            id: AlertId::new(),
            message: message.into(),
            details,
            received_at: time::now(),
        }
    }
}

/// Interpreted response of the analysis collaborator.
///
/// The wire shape is `{anomaly: bool, message: string, ...}`; every other
/// key is kept verbatim in `details`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisVerdict {
    pub anomaly: bool,
    pub message: Option<String>,
    pub details: Map<String, Value>,
}

impl AnalysisVerdict {
    /// Interpret a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`OwlHubError::AnalysisProtocol`] if the body is not an object
    /// or lacks a boolean `anomaly` flag.
    pub fn from_value(body: Value) -> Result<Self, OwlHubError> {
        let Value::Object(details) = body else {
            return Err(OwlHubError::AnalysisProtocol(
                "response body is not a JSON object".into(),
            ));
        };

        let anomaly = details
            .get("anomaly")
            .and_then(Value::as_bool)
            .ok_or_else(|| OwlHubError::AnalysisProtocol("missing boolean `anomaly` flag".into()))?;

        let message = details
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Ok(Self {
            anomaly,
            message,
            details,
        })
    }

    /// Turn a positive verdict into an alert; negative verdicts yield `None`.
    #[must_use]
    pub fn into_alert(self) -> Option<AnomalyAlert> {
        if !self.anomaly {
            return None;
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_ALERT_MESSAGE.to_string());
        Some(AnomalyAlert::new(message, self.details))
    }
}
