//! Automation controller: derives the actuator command from each reading.
//!
//! Rule: humidity above the threshold **and** motion detected switches the
//! actuator on; anything else, including absent fields, switches it off.
//! The command is recomputed and written on every reading, with no
//! hysteresis or debounce.

use owlhub_domain::command::AutomationCommand;
use owlhub_domain::error::OwlHubError;
use owlhub_domain::telemetry::Telemetry;

use crate::ports::Connection;

/// Relative humidity (percent) above which the blower may run.
pub const DEFAULT_HUMIDITY_THRESHOLD: f64 = 60.0;

/// Stateless threshold rule driving the device actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationController {
    humidity_threshold: f64,
}

impl Default for AutomationController {
    fn default() -> Self {
        Self::new(DEFAULT_HUMIDITY_THRESHOLD)
    }
}

impl AutomationController {
    /// Create a controller with the given humidity threshold.
    #[must_use]
    pub const fn new(humidity_threshold: f64) -> Self {
        Self { humidity_threshold }
    }

    /// Compute the command for `reading`.
    #[must_use]
    pub fn decide(&self, reading: &Telemetry) -> AutomationCommand {
        let humid = reading
            .humidity
            .is_some_and(|h| h > self.humidity_threshold);
        let motion = reading.motion.unwrap_or(false);

        if humid && motion {
            AutomationCommand::ActuatorOn
        } else {
            AutomationCommand::ActuatorOff
        }
    }

    /// Decide and write the command to `connection`.
    ///
    /// # Errors
    ///
    /// Returns the transport fault when the write fails; the decision itself
    /// never fails.
    pub fn drive<C: Connection>(
        &self,
        reading: &Telemetry,
        connection: &mut C,
    ) -> Result<AutomationCommand, OwlHubError> {
        let command = self.decide(reading);
        connection.write(&[command.as_byte()])?;

        if command.is_on() {
            tracing::info!(humidity = ?reading.humidity, "automation: actuator on");
        } else {
            tracing::debug!("automation: actuator off");
        }
        Ok(command)
    }
}
