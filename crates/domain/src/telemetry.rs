//! Telemetry: one decoded sensor snapshot.
//!
//! Every field is independently optional: a record emitted by the device may
//! carry any subset of them. A new reading replaces the previous one; readings
//! are never patched in place.

use serde::{Deserialize, Serialize};

/// A single sensor snapshot as decoded from one device line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Telemetry {
    /// Temperature in degrees Celsius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Whether the motion sensor reports presence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<bool>,
    /// Raw gas sensor level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_level: Option<i64>,
    /// Alarm indicator as reported by the firmware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm: Option<i64>,
}

impl Telemetry {
    /// Whether no field could be extracted from the source line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Number of fields present in this snapshot.
    #[must_use]
    pub fn field_count(&self) -> usize {
        [
            self.temperature.is_some(),
            self.humidity.is_some(),
            self.motion.is_some(),
            self.gas_level.is_some(),
            self.alarm.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Return a copy with the temperature replaced.
    #[must_use]
    pub fn with_temperature(self, temperature: Option<f64>) -> Self {
        Self {
            temperature,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_empty_by_default() {
        let t = Telemetry::default();
        assert!(t.is_empty());
        assert_eq!(t.field_count(), 0);
    }

    #[test]
    fn should_count_present_fields() {
        let t = Telemetry {
            temperature: Some(21.5),
            motion: Some(false),
            ..Telemetry::default()
        };
        assert!(!t.is_empty());
        assert_eq!(t.field_count(), 2);
    }

    #[test]
    fn should_replace_temperature_without_touching_other_fields() {
        let t = Telemetry {
            temperature: Some(33.9),
            humidity: Some(36.0),
            ..Telemetry::default()
        };
        let replaced = t.with_temperature(Some(21.5));
        assert_eq!(replaced.temperature, Some(21.5));
        assert_eq!(replaced.humidity, Some(36.0));
        assert_eq!(t.temperature, Some(33.9));
    }

    #[test]
    fn should_omit_absent_fields_when_serialized() {
        let t = Telemetry {
            humidity: Some(60.0),
            ..Telemetry::default()
        };
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json, serde_json::json!({"humidity": 60.0}));
    }

    #[test]
    fn should_deserialize_partial_object() {
        let t: Telemetry = serde_json::from_str(r#"{"gas_level": 123}"#).unwrap();
        assert_eq!(t.gas_level, Some(123));
        assert_eq!(t.temperature, None);
    }
}
