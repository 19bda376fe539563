//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `owlhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use owlhub_adapter_anomaly_http::AnalysisConfig;
use owlhub_adapter_serial::SerialConfig;
use owlhub_app::automation::DEFAULT_HUMIDITY_THRESHOLD;
use owlhub_app::calibrator::DEFAULT_TEMPERATURE_OFFSET;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Serial transport and device selection.
    pub serial: SerialConfig,
    /// Sensor calibration.
    pub calibration: CalibrationConfig,
    /// Actuator rule.
    pub automation: AutomationConfig,
    /// Anomaly analysis service.
    pub analysis: AnalysisConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Calibration offsets measured for the deployed sensor.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Added to every temperature reading before rounding.
    pub temperature_offset: f64,
}

/// Automation rule settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Relative humidity above which motion switches the actuator on.
    pub humidity_threshold: f64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `owlhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("owlhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides looked up through `var` (the process environment in
    /// production).
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("OWLHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("OWLHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("OWLHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("OWLHUB_SERIAL_PATH") {
            self.serial.path = Some(val).filter(|path| !path.is_empty());
        }
        if let Some(baud_rate) = var("OWLHUB_BAUD_RATE").and_then(|val| val.parse().ok()) {
            self.serial.baud_rate = baud_rate;
        }
        if let Some(val) = var("OWLHUB_ANALYSIS_URL") {
            self.analysis.url = val;
        }
        if let Some(val) = var("OWLHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "serial baud_rate must be non-zero".to_string(),
            ));
        }
        if self.analysis.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "analysis url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            temperature_offset: DEFAULT_TEMPERATURE_OFFSET,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            humidity_threshold: DEFAULT_HUMIDITY_THRESHOLD,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "owlhub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
