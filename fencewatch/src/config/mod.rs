//! Configuration file handling.
//!
//! Settings live in an INI file, by default at
//! `<config_dir>/fencewatch/config.ini`:
//!
//! ```ini
//! [detection]
//! proximity_threshold_cm = 50
//! sampling_interval_ms = 500
//!
//! [actuator]
//! url = http://127.0.0.1:8000/gpio/pins
//! output_id = 17
//!
//! [labels]
//! monitored = bird, cat, dog
//!
//! [label.dog]
//! severity = medium
//! confidence_low = 0.6
//! confidence_high = 0.9
//! ```
//!
//! A missing file means built-in defaults. Every scalar setting is
//! addressable as a [`ConfigKey`] (`section.key`) for the CLI.

mod file;
mod keys;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    ActuatorSettings, AlertSettings, CameraSettings, ClassifierSettings, ConfigFile,
    DetectionSettings, TelemetrySettings,
};
pub use keys::ConfigKey;

/// Configuration file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding FenceWatch configuration.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fencewatch")
}

/// Default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
