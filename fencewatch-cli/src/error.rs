//! CLI error type.

use std::fmt;

use fencewatch::actuator::ActuatorError;
use fencewatch::config::ConfigError;
use fencewatch::distance::ListenerError;
use fencewatch::http::HttpError;
use fencewatch::logging::LoggingError;
use fencewatch::vision::FrameError;

/// Errors that end a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments or settings.
    Config(String),
    /// Configuration file could not be loaded or saved.
    ConfigFile(ConfigError),
    /// Logging could not be installed.
    Logging(LoggingError),
    /// An HTTP adapter could not be created.
    Http(HttpError),
    /// The distance listener failed to start.
    Listener(ListenerError),
    /// A pin command failed.
    Actuator(ActuatorError),
    /// The camera adapter could not be created.
    Camera(FrameError),
    /// Local I/O failure (runtime, stdin, sockets).
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::Listener(e) => write!(f, "Distance listener: {}", e),
            CliError::Actuator(e) => write!(f, "Actuator: {}", e),
            CliError::Camera(e) => write!(f, "Camera: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::Http(e)
    }
}

impl From<ListenerError> for CliError {
    fn from(e: ListenerError) -> Self {
        CliError::Listener(e)
    }
}

impl From<ActuatorError> for CliError {
    fn from(e: ActuatorError) -> Self {
        CliError::Actuator(e)
    }
}

impl From<FrameError> for CliError {
    fn from(e: FrameError) -> Self {
        CliError::Camera(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
