//! Wire shape of the analysis request.

use serde::Serialize;

use owlhub_domain::telemetry::Telemetry;

/// Request body in the field names the analysis service expects.
///
/// Absent fields are omitted; motion is sent as `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<i64>,
}

impl From<&Telemetry> for AnalysisPayload {
    fn from(reading: &Telemetry) -> Self {
        Self {
            temp: reading.temperature,
            humidity: reading.humidity,
            motion: reading.motion.map(u8::from),
            gas: reading.gas_level,
            alarm: reading.alarm,
        }
    }
}
