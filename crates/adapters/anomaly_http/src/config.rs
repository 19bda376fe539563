//! Analysis service configuration.

use std::time::Duration;

use serde::Deserialize;

use owlhub_domain::alert::ALERT_TTL;

/// Where and how readings are submitted for anomaly analysis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Endpoint receiving one POST per reading.
    pub url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// How long a reported anomaly stays active, in seconds.
    pub alert_ttl_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/data".to_string(),
            timeout_secs: 10,
            alert_ttl_secs: ALERT_TTL.as_secs(),
        }
    }
}

impl AnalysisConfig {
    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Lifetime of a published alert.
    #[must_use]
    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_ttl_secs)
    }
}
