//! The INI-backed configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::warn;

use super::keys::ConfigKey;
use super::ConfigError;
use crate::actuator::{DEFAULT_ACTUATOR_TIMEOUT, DEFAULT_AUTO_OFF, DEFAULT_OUTPUT_ID};
use crate::alert::{
    ConfidenceRange, LabelPolicy, LabelProfile, Location, Severity, DEFAULT_CONFIDENCE_RANGE,
    DEFAULT_DISPATCH_TIMEOUT, DEFAULT_SEVERITY,
};
use crate::sampling::{DEFAULT_PROXIMITY_THRESHOLD_CM, DEFAULT_SAMPLING_INTERVAL};
use crate::vision::DEFAULT_CONFIDENCE_FLOOR;

const LABEL_SECTION_PREFIX: &str = "label.";

/// `[detection]`: gating and loop pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub proximity_threshold_cm: f64,
    pub sampling_interval_ms: u64,
    pub confidence_floor: f64,
    pub loop_pause_ms: u64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            proximity_threshold_cm: DEFAULT_PROXIMITY_THRESHOLD_CM,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL.as_millis() as u64,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            loop_pause_ms: 10,
        }
    }
}

/// `[camera]`: MJPEG stream endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub stream_url: String,
    pub timeout_secs: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            stream_url: "http://127.0.0.1:81/stream".to_string(),
            timeout_secs: 10,
        }
    }
}

/// `[classifier]`: inference endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9000/detect".to_string(),
            timeout_secs: 5,
        }
    }
}

/// `[actuator]`: pin-control service and alarm timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorSettings {
    pub url: String,
    pub output_id: u8,
    pub auto_off_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/gpio/pins".to_string(),
            output_id: DEFAULT_OUTPUT_ID,
            auto_off_ms: DEFAULT_AUTO_OFF.as_millis() as u64,
            timeout_secs: DEFAULT_ACTUATOR_TIMEOUT.as_secs(),
        }
    }
}

/// `[alerts]`: collector endpoint and deployment location.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub url: String,
    pub timeout_secs: u64,
    pub location: Location,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000/api/log/create".to_string(),
            timeout_secs: DEFAULT_DISPATCH_TIMEOUT.as_secs(),
            location: Location::default(),
        }
    }
}

/// `[telemetry]`: where the distance listener binds.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub bind_address: String,
    pub port: u16,
}

impl TelemetrySettings {
    /// `address:port` for binding.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Complete FenceWatch configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub detection: DetectionSettings,
    pub camera: CameraSettings,
    pub classifier: ClassifierSettings,
    pub actuator: ActuatorSettings,
    pub alerts: AlertSettings,
    pub telemetry: TelemetrySettings,
    pub labels: LabelPolicy,
}

impl ConfigFile {
    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(err) => ConfigError::Parse {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;

        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.to_ini().write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.detection.sampling_interval_ms)
    }

    pub fn loop_pause(&self) -> Duration {
        Duration::from_millis(self.detection.loop_pause_ms)
    }

    pub fn auto_off(&self) -> Duration {
        Duration::from_millis(self.actuator.auto_off_ms)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (section, props) in ini.iter() {
            let Some(section) = section else {
                continue;
            };

            if let Some(label) = section.strip_prefix(LABEL_SECTION_PREFIX) {
                config.apply_label_section(section, label, props)?;
                continue;
            }

            for (key, value) in props.iter() {
                match ConfigKey::lookup(section, key) {
                    Some(config_key) => config_key.set(&mut config, value)?,
                    None => warn!(section, key, "Ignoring unknown configuration key"),
                }
            }
        }

        Ok(config)
    }

    fn apply_label_section(
        &mut self,
        section: &str,
        label: &str,
        props: &ini::Properties,
    ) -> Result<(), ConfigError> {
        let existing = self.labels.profile(label);
        let mut severity = existing.map(|p| p.severity).unwrap_or(DEFAULT_SEVERITY);
        let base_range = existing
            .and_then(|p| p.confidence)
            .unwrap_or(DEFAULT_CONFIDENCE_RANGE);
        let mut low = None;
        let mut high = None;

        for (key, value) in props.iter() {
            let invalid = |reason: &str| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            };

            match key {
                "severity" => {
                    severity = value
                        .parse::<Severity>()
                        .map_err(|_| invalid("expected low, medium, high or critical"))?;
                }
                "confidence_low" => {
                    low = Some(parse_unit(value).ok_or_else(|| invalid(UNIT_REASON))?);
                }
                "confidence_high" => {
                    high = Some(parse_unit(value).ok_or_else(|| invalid(UNIT_REASON))?);
                }
                _ => warn!(section, key, "Ignoring unknown label key"),
            }
        }

        let confidence = match (low, high, existing.and_then(|p| p.confidence)) {
            (None, None, current) => current,
            (low, high, _) => {
                let range = ConfidenceRange::new(
                    low.unwrap_or(base_range.low),
                    high.unwrap_or(base_range.high),
                );
                if range.low > range.high {
                    return Err(ConfigError::InvalidValue {
                        section: section.to_string(),
                        key: "confidence_low".to_string(),
                        value: range.low.to_string(),
                        reason: format!("greater than confidence_high ({})", range.high),
                    });
                }
                Some(range)
            }
        };

        self.labels.set_profile(
            label,
            LabelProfile {
                severity,
                confidence,
            },
        );
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        for (label, profile) in self.labels.profiles() {
            let section = format!("{}{}", LABEL_SECTION_PREFIX, label);
            let mut setter = ini.with_section(Some(section));
            setter.set("severity", profile.severity.as_str());
            if let Some(range) = profile.confidence {
                setter
                    .set("confidence_low", range.low.to_string())
                    .set("confidence_high", range.high.to_string());
            }
        }

        ini
    }
}

pub(super) const UNIT_REASON: &str = "expected a number between 0 and 1";

/// Parse a finite number in `[0, 1]`.
pub(super) fn parse_unit(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| (0.0..=1.0).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.detection.proximity_threshold_cm, 50.0);
        assert_eq!(config.sampling_interval(), Duration::from_millis(500));
        assert_eq!(config.detection.confidence_floor, 0.5);
        assert_eq!(config.loop_pause(), Duration::from_millis(10));
        assert_eq!(config.actuator.output_id, 17);
        assert_eq!(config.auto_off(), Duration::from_secs(1));
        assert_eq!(config.telemetry.socket_address(), "0.0.0.0:5000");
        assert_eq!(config.alerts.location.zone, "North Pasture");
        assert_eq!(config.labels, LabelPolicy::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("nope.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = ConfigFile::parse(
            "[detection]\n\
             proximity_threshold_cm = 35.5\n\
             sampling_interval_ms = 250\n\
             [actuator]\n\
             output_id = 27\n\
             [telemetry]\n\
             port = 6000\n\
             [alerts]\n\
             zone = South Gate\n",
        )
        .unwrap();

        assert_eq!(config.detection.proximity_threshold_cm, 35.5);
        assert_eq!(config.sampling_interval(), Duration::from_millis(250));
        assert_eq!(config.actuator.output_id, 27);
        assert_eq!(config.telemetry.port, 6000);
        assert_eq!(config.alerts.location.zone, "South Gate");
        // Untouched values keep defaults.
        assert_eq!(config.detection.confidence_floor, 0.5);
    }

    #[test]
    fn test_invalid_value_names_section_and_key() {
        let err = ConfigFile::parse("[telemetry]\nport = seventy\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "telemetry");
                assert_eq!(key, "port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_label_sections() {
        let config = ConfigFile::parse(
            "[labels]\n\
             monitored = fox, Dog\n\
             [label.fox]\n\
             severity = high\n\
             confidence_low = 0.55\n\
             [label.dog]\n\
             severity = critical\n",
        )
        .unwrap();

        assert_eq!(config.labels.monitored_labels(), vec!["dog", "fox"]);
        assert_eq!(config.labels.base_severity("fox"), Severity::High);
        assert_eq!(
            config.labels.confidence_range("fox"),
            ConfidenceRange::new(0.55, DEFAULT_CONFIDENCE_RANGE.high)
        );
        // Severity override keeps the default dog range.
        assert_eq!(config.labels.base_severity("dog"), Severity::Critical);
        assert_eq!(
            config.labels.confidence_range("dog"),
            ConfidenceRange::new(0.6, 0.9)
        );
    }

    #[test]
    fn test_bad_label_values() {
        assert!(ConfigFile::parse("[label.dog]\nseverity = extreme\n").is_err());
        assert!(ConfigFile::parse("[label.dog]\nconfidence_low = 1.5\n").is_err());
        assert!(
            ConfigFile::parse("[label.dog]\nconfidence_low = 0.9\nconfidence_high = 0.2\n")
                .is_err()
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = ConfigFile::parse("[detection]\nturbo = yes\n[misc]\na = b\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.detection.proximity_threshold_cm = 42.0;
        config.camera.stream_url = "http://cam.local:81/stream".to_string();
        config.labels.set_monitored(["dog", "bear"]);
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ini_string_contains_sections() {
        let text = ConfigFile::default().to_ini_string();
        assert!(text.contains("[detection]"));
        assert!(text.contains("proximity_threshold_cm=50"));
        assert!(text.contains("[label.elephant]"));
        assert!(text.contains("severity=critical"));
    }
}
