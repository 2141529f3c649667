//! Addressable configuration keys.
//!
//! Each scalar setting has a `section.key` name used both by the INI
//! reader/writer and by `fencewatch config get/set`.

use std::fmt;
use std::str::FromStr;

use super::file::{parse_unit, ConfigFile, UNIT_REASON};
use super::ConfigError;

/// A single scalar configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DetectionProximityThreshold,
    DetectionSamplingInterval,
    DetectionConfidenceFloor,
    DetectionLoopPause,
    CameraStreamUrl,
    CameraTimeout,
    ClassifierUrl,
    ClassifierTimeout,
    ActuatorUrl,
    ActuatorOutputId,
    ActuatorAutoOff,
    ActuatorTimeout,
    AlertsUrl,
    AlertsTimeout,
    AlertsLatitude,
    AlertsLongitude,
    AlertsZone,
    TelemetryBindAddress,
    TelemetryPort,
    LabelsMonitored,
}

impl ConfigKey {
    /// All keys, in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            DetectionProximityThreshold,
            DetectionSamplingInterval,
            DetectionConfidenceFloor,
            DetectionLoopPause,
            CameraStreamUrl,
            CameraTimeout,
            ClassifierUrl,
            ClassifierTimeout,
            ActuatorUrl,
            ActuatorOutputId,
            ActuatorAutoOff,
            ActuatorTimeout,
            AlertsUrl,
            AlertsTimeout,
            AlertsLatitude,
            AlertsLongitude,
            AlertsZone,
            TelemetryBindAddress,
            TelemetryPort,
            LabelsMonitored,
        ]
    }

    /// Find the key for an INI `section` and `key`.
    pub fn lookup(section: &str, key: &str) -> Option<ConfigKey> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.section() == section && k.key_name() == key)
    }

    pub fn section(self) -> &'static str {
        use ConfigKey::*;
        match self {
            DetectionProximityThreshold
            | DetectionSamplingInterval
            | DetectionConfidenceFloor
            | DetectionLoopPause => "detection",
            CameraStreamUrl | CameraTimeout => "camera",
            ClassifierUrl | ClassifierTimeout => "classifier",
            ActuatorUrl | ActuatorOutputId | ActuatorAutoOff | ActuatorTimeout => "actuator",
            AlertsUrl | AlertsTimeout | AlertsLatitude | AlertsLongitude | AlertsZone => "alerts",
            TelemetryBindAddress | TelemetryPort => "telemetry",
            LabelsMonitored => "labels",
        }
    }

    pub fn key_name(self) -> &'static str {
        use ConfigKey::*;
        match self {
            DetectionProximityThreshold => "proximity_threshold_cm",
            DetectionSamplingInterval => "sampling_interval_ms",
            DetectionConfidenceFloor => "confidence_floor",
            DetectionLoopPause => "loop_pause_ms",
            CameraStreamUrl => "stream_url",
            CameraTimeout | ClassifierTimeout | ActuatorTimeout | AlertsTimeout => "timeout_secs",
            ClassifierUrl | ActuatorUrl | AlertsUrl => "url",
            ActuatorOutputId => "output_id",
            ActuatorAutoOff => "auto_off_ms",
            AlertsLatitude => "latitude",
            AlertsLongitude => "longitude",
            AlertsZone => "zone",
            TelemetryBindAddress => "bind_address",
            TelemetryPort => "port",
            LabelsMonitored => "monitored",
        }
    }

    /// Full `section.key` name.
    pub fn name(self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as text.
    pub fn get(self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        match self {
            DetectionProximityThreshold => config.detection.proximity_threshold_cm.to_string(),
            DetectionSamplingInterval => config.detection.sampling_interval_ms.to_string(),
            DetectionConfidenceFloor => config.detection.confidence_floor.to_string(),
            DetectionLoopPause => config.detection.loop_pause_ms.to_string(),
            CameraStreamUrl => config.camera.stream_url.clone(),
            CameraTimeout => config.camera.timeout_secs.to_string(),
            ClassifierUrl => config.classifier.url.clone(),
            ClassifierTimeout => config.classifier.timeout_secs.to_string(),
            ActuatorUrl => config.actuator.url.clone(),
            ActuatorOutputId => config.actuator.output_id.to_string(),
            ActuatorAutoOff => config.actuator.auto_off_ms.to_string(),
            ActuatorTimeout => config.actuator.timeout_secs.to_string(),
            AlertsUrl => config.alerts.url.clone(),
            AlertsTimeout => config.alerts.timeout_secs.to_string(),
            AlertsLatitude => config.alerts.location.latitude.to_string(),
            AlertsLongitude => config.alerts.location.longitude.to_string(),
            AlertsZone => config.alerts.location.zone.clone(),
            TelemetryBindAddress => config.telemetry.bind_address.clone(),
            TelemetryPort => config.telemetry.port.to_string(),
            LabelsMonitored => config.labels.monitored_labels().join(", "),
        }
    }

    /// Validate `value` and store it.
    pub fn set(self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            DetectionProximityThreshold => {
                config.detection.proximity_threshold_cm = value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .ok_or_else(|| invalid("expected a positive distance in cm"))?;
            }
            DetectionSamplingInterval => {
                config.detection.sampling_interval_ms =
                    parse_positive(value).ok_or_else(|| invalid(MILLIS_REASON))?;
            }
            DetectionConfidenceFloor => {
                config.detection.confidence_floor =
                    parse_unit(value).ok_or_else(|| invalid(UNIT_REASON))?;
            }
            DetectionLoopPause => {
                config.detection.loop_pause_ms =
                    value.parse().map_err(|_| invalid("expected a number of milliseconds"))?;
            }
            CameraStreamUrl => {
                config.camera.stream_url = parse_url(value).ok_or_else(|| invalid(URL_REASON))?;
            }
            CameraTimeout => {
                config.camera.timeout_secs =
                    parse_positive(value).ok_or_else(|| invalid(SECS_REASON))?;
            }
            ClassifierUrl => {
                config.classifier.url = parse_url(value).ok_or_else(|| invalid(URL_REASON))?;
            }
            ClassifierTimeout => {
                config.classifier.timeout_secs =
                    parse_positive(value).ok_or_else(|| invalid(SECS_REASON))?;
            }
            ActuatorUrl => {
                config.actuator.url = parse_url(value).ok_or_else(|| invalid(URL_REASON))?;
            }
            ActuatorOutputId => {
                config.actuator.output_id = value
                    .parse()
                    .map_err(|_| invalid("expected a pin number (0-255)"))?;
            }
            ActuatorAutoOff => {
                config.actuator.auto_off_ms =
                    parse_positive(value).ok_or_else(|| invalid(MILLIS_REASON))?;
            }
            ActuatorTimeout => {
                config.actuator.timeout_secs =
                    parse_positive(value).ok_or_else(|| invalid(SECS_REASON))?;
            }
            AlertsUrl => {
                config.alerts.url = parse_url(value).ok_or_else(|| invalid(URL_REASON))?;
            }
            AlertsTimeout => {
                config.alerts.timeout_secs =
                    parse_positive(value).ok_or_else(|| invalid(SECS_REASON))?;
            }
            AlertsLatitude => {
                config.alerts.location.latitude = parse_degrees(value, 90.0)
                    .ok_or_else(|| invalid("expected a latitude between -90 and 90"))?;
            }
            AlertsLongitude => {
                config.alerts.location.longitude = parse_degrees(value, 180.0)
                    .ok_or_else(|| invalid("expected a longitude between -180 and 180"))?;
            }
            AlertsZone => config.alerts.location.zone = value.to_string(),
            TelemetryBindAddress => {
                if value.is_empty() {
                    return Err(invalid("expected an address"));
                }
                config.telemetry.bind_address = value.to_string();
            }
            TelemetryPort => {
                config.telemetry.port = value
                    .parse()
                    .map_err(|_| invalid("expected a port number"))?;
            }
            LabelsMonitored => config.labels.set_monitored(value.split(',')),
        }

        Ok(())
    }
}

const MILLIS_REASON: &str = "expected a positive number of milliseconds";
const SECS_REASON: &str = "expected a positive number of seconds";
const URL_REASON: &str = "expected an http:// or https:// URL";

fn parse_positive(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().filter(|v| *v > 0)
}

fn parse_url(value: &str) -> Option<String> {
    (value.starts_with("http://") || value.starts_with("https://")).then(|| value.to_string())
}

fn parse_degrees(value: &str, limit: f64) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = s
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        Self::lookup(section, key).ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<String> = ConfigKey::all().iter().map(|k| k.name()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_parse_key_name() {
        let key: ConfigKey = "actuator.output_id".parse().unwrap();
        assert_eq!(key, ConfigKey::ActuatorOutputId);
        assert_eq!(key.to_string(), "actuator.output_id");

        assert!("actuator".parse::<ConfigKey>().is_err());
        assert!("actuator.colour".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut config = ConfigFile::default();
        ConfigKey::TelemetryPort.set(&mut config, "6001").unwrap();
        assert_eq!(ConfigKey::TelemetryPort.get(&config), "6001");

        ConfigKey::LabelsMonitored
            .set(&mut config, "dog, Bear ,fox")
            .unwrap();
        assert_eq!(ConfigKey::LabelsMonitored.get(&config), "bear, dog, fox");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::DetectionProximityThreshold
            .set(&mut config, "-3")
            .is_err());
        assert!(ConfigKey::DetectionProximityThreshold
            .set(&mut config, "NaN")
            .is_err());
        assert!(ConfigKey::DetectionConfidenceFloor
            .set(&mut config, "1.2")
            .is_err());
        assert!(ConfigKey::DetectionSamplingInterval
            .set(&mut config, "0")
            .is_err());
        assert!(ConfigKey::ActuatorOutputId.set(&mut config, "300").is_err());
        assert!(ConfigKey::ActuatorUrl.set(&mut config, "pi:8000").is_err());
        assert!(ConfigKey::AlertsLatitude.set(&mut config, "91").is_err());

        // Failed sets leave the config untouched.
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_loop_pause_may_be_zero() {
        let mut config = ConfigFile::default();
        ConfigKey::DetectionLoopPause.set(&mut config, "0").unwrap();
        assert_eq!(config.detection.loop_pause_ms, 0);
    }
}
