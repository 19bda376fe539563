//! Calibrator: fixed offset correction of decoded readings.

use owlhub_domain::telemetry::Telemetry;

/// Temperature correction measured for the deployed sensor.
pub const DEFAULT_TEMPERATURE_OFFSET: f64 = -12.4;

/// Applies a deployment-time additive offset to the temperature field.
///
/// Only temperature is touched; the corrected value is rounded to one
/// decimal place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrator {
    temperature_offset: f64,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPERATURE_OFFSET)
    }
}

impl Calibrator {
    /// Create a calibrator with the given temperature offset.
    #[must_use]
    pub const fn new(temperature_offset: f64) -> Self {
        Self { temperature_offset }
    }

    /// Return the calibrated copy of `reading`.
    #[must_use]
    pub fn calibrate(&self, reading: Telemetry) -> Telemetry {
        let corrected = reading
            .temperature
            .map(|t| round_one_decimal(t + self.temperature_offset));
        reading.with_temperature(corrected)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
