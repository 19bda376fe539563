//! Actuator command written back to the device.

use serde::{Deserialize, Serialize};

/// Control signal for the device actuator (the blower).
///
/// Derived from a single reading and never remembered between readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationCommand {
    ActuatorOn,
    ActuatorOff,
}

impl AutomationCommand {
    /// Single-byte wire encoding understood by the firmware.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::ActuatorOn => b'B',
            Self::ActuatorOff => b'b',
        }
    }

    /// Whether this command switches the actuator on.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::ActuatorOn)
    }
}

impl std::fmt::Display for AutomationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActuatorOn => f.write_str("on"),
            Self::ActuatorOff => f.write_str("off"),
        }
    }
}
