//! Line decoder: turns one raw device record into [`Telemetry`].
//!
//! Firmware revisions emit three wire formats, sometimes with verbose debug
//! output mixed into the same stream:
//!
//! | Format | Example |
//! |--------|---------|
//! | Labeled | `Data Sent: temp: 33.9  humidity: 36.0 motion: 0 gas: 120` |
//! | Compact | `HUM:60.00,TEMP:25.00,MOT:1` |
//! | Positional CSV | `25.00,60.00,1,123` (temperature, humidity, motion, gas) |
//!
//! Labeled and compact patterns are tried per field, labeled first. The
//! positional form is only considered when no tagged field was found on the
//! whole line. Decoding never fails: unparsable values are simply absent.

use std::sync::LazyLock;

use regex::Regex;

use owlhub_domain::telemetry::Telemetry;

/// Minimum number of comma-separated values for the positional form.
const POSITIONAL_MIN_FIELDS: usize = 4;

/// Alternative patterns for one field, tried in order.
struct FieldPatterns(Vec<Regex>);

impl FieldPatterns {
    fn new(patterns: &[&str]) -> Self {
        Self(
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("field pattern must be a valid regex"))
                .collect(),
        )
    }

    /// First value captured by any pattern that also parses as `T`.
    fn extract<T: std::str::FromStr>(&self, line: &str) -> Option<T> {
        self.0.iter().find_map(|re| {
            re.captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}

static TEMPERATURE: LazyLock<FieldPatterns> =
    LazyLock::new(|| FieldPatterns::new(&[r"(?i)temp:\s*(-?[\d.]+)", r"TEMP:(-?[\d.]+)"]));
static HUMIDITY: LazyLock<FieldPatterns> =
    LazyLock::new(|| FieldPatterns::new(&[r"(?i)humidity:\s*([\d.]+)", r"HUM:([\d.]+)"]));
static MOTION: LazyLock<FieldPatterns> =
    LazyLock::new(|| FieldPatterns::new(&[r"(?i)motion:\s*(\d+)", r"MOT:(\d+)"]));
static GAS: LazyLock<FieldPatterns> =
    LazyLock::new(|| FieldPatterns::new(&[r"(?i)gas:\s*(\d+)", r"GAS:(\d+)"]));
// "Alaram" is how some firmware revisions spell it.
static ALARM: LazyLock<FieldPatterns> =
    LazyLock::new(|| FieldPatterns::new(&[r"(?i)alara?m:\s*(\d+)"]));

/// Decode one raw line.
///
/// Surrounding whitespace and the `\r` of `\r\n` framing are ignored.
/// A line without any usable field yields an empty [`Telemetry`].
#[must_use]
pub fn decode(raw: &str) -> Telemetry {
    let line = raw.trim();
    let tagged = decode_tagged(line);
    if !tagged.is_empty() {
        return tagged;
    }
    decode_positional(line).unwrap_or_default()
}

/// Labeled and compact `key:value` tokens, composed field by field.
fn decode_tagged(line: &str) -> Telemetry {
    Telemetry {
        temperature: TEMPERATURE.extract(line),
        humidity: HUMIDITY.extract(line),
        motion: MOTION.extract::<i64>(line).map(|m| m != 0),
        gas_level: GAS.extract(line),
        alarm: ALARM.extract(line),
    }
}

/// Positional `temperature,humidity,motion,gas` fallback.
///
/// Returns `None` unless the line has enough comma-separated values and the
/// first one is a finite number. `nan` and `inf` count as absent.
fn decode_positional(line: &str) -> Option<Telemetry> {
    if !line.contains(',') {
        return None;
    }

    let values: Vec<&str> = line.split(',').map(str::trim).collect();
    if values.len() < POSITIONAL_MIN_FIELDS {
        return None;
    }

    let temperature = parse_finite(values[0])?;

    Some(Telemetry {
        temperature: Some(temperature),
        humidity: parse_finite(values[1]),
        motion: values[2].parse::<i64>().ok().map(|m| m != 0),
        gas_level: values[3].parse().ok(),
        alarm: None,
    })
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
