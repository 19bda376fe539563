//! Event: what subscribers receive from the fan-out.

use serde::{Deserialize, Serialize};

use crate::alert::AnomalyAlert;
use crate::id::AlertId;
use crate::telemetry::Telemetry;
use crate::time::Timestamp;

/// A message delivered to every registered subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new calibrated reading replaced the current one.
    Telemetry { reading: Telemetry },
    /// The analysis collaborator flagged an anomaly.
    AnomalyAlert { alert: AnomalyAlert },
    /// A previously published alert expired.
    AlertCleared {
        alert_id: AlertId,
        cleared_at: Timestamp,
    },
}

impl Event {
    /// Short name of the event kind, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Telemetry { .. } => "telemetry",
            Self::AnomalyAlert { .. } => "anomaly_alert",
            Self::AlertCleared { .. } => "alert_cleared",
        }
    }
}

impl From<Telemetry> for Event {
    fn from(reading: Telemetry) -> Self {
        Self::Telemetry { reading }
    }
}

impl From<AnomalyAlert> for Event {
    fn from(alert: AnomalyAlert) -> Self {
        Self::AnomalyAlert { alert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_telemetry_with_type_tag() {
        let event = Event::from(Telemetry {
            humidity: Some(60.0),
            ..Telemetry::default()
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "telemetry", "reading": {"humidity": 60.0}})
        );
    }

    #[test]
    fn should_report_kind() {
        let alert = AnomalyAlert::new("x", serde_json::Map::new());
        assert_eq!(Event::from(alert).kind(), "anomaly_alert");
        assert_eq!(Event::from(Telemetry::default()).kind(), "telemetry");
    }

    #[test]
    fn should_roundtrip_alert_cleared() {
        let event = Event::AlertCleared {
            alert_id: AlertId::new(),
            cleared_at: crate::time::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
