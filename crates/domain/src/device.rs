//! Device candidate: a transport endpoint found during one discovery pass.

use serde::{Deserialize, Serialize};

/// A byte-stream endpoint that may lead to the sensor device.
///
/// Candidates are ephemeral: every discovery pass produces a fresh list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCandidate {
    /// Platform path of the endpoint (e.g. `/dev/ttyUSB0`, `COM3`).
    pub path: String,
    /// Manufacturer string reported by the host, when known.
    pub manufacturer_hint: Option<String>,
}

impl DeviceCandidate {
    /// Create a candidate with no manufacturer information.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            manufacturer_hint: None,
        }
    }

    /// Attach a manufacturer hint.
    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer_hint = Some(manufacturer.into());
        self
    }

    /// Whether the manufacturer hint contains any of the given signatures.
    #[must_use]
    pub fn matches_vendor(&self, signatures: &[String]) -> bool {
        self.manufacturer_hint
            .as_deref()
            .is_some_and(|mfr| signatures.iter().any(|sig| mfr.contains(sig.as_str())))
    }

    /// Whether the path contains the given token.
    #[must_use]
    pub fn path_contains(&self, token: &str) -> bool {
        !token.is_empty() && self.path.contains(token)
    }
}

impl std::fmt::Display for DeviceCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.manufacturer_hint {
            Some(mfr) => write!(f, "{} ({mfr})", self.path),
            None => f.write_str(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendors() -> Vec<String> {
        vec!["Arduino".to_string(), "wch.cn".to_string()]
    }

    #[test]
    fn should_match_vendor_substring() {
        let c = DeviceCandidate::new("/dev/ttyACM0").with_manufacturer("Arduino (www.arduino.cc)");
        assert!(c.matches_vendor(&vendors()));
    }

    #[test]
    fn should_not_match_vendor_without_hint() {
        let c = DeviceCandidate::new("/dev/ttyACM0");
        assert!(!c.matches_vendor(&vendors()));
    }

    #[test]
    fn should_not_match_empty_path_token() {
        let c = DeviceCandidate::new("/dev/ttyUSB0");
        assert!(c.path_contains("USB"));
        assert!(!c.path_contains(""));
    }

    #[test]
    fn should_display_path_and_manufacturer() {
        let c = DeviceCandidate::new("COM3").with_manufacturer("wch.cn");
        assert_eq!(c.to_string(), "COM3 (wch.cn)");
        assert_eq!(DeviceCandidate::new("COM4").to_string(), "COM4");
    }
}
