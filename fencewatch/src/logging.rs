//! Logging setup.
//!
//! Human-readable logs go to stderr. With a log file configured, the same
//! events are also written there through a non-blocking background writer;
//! the returned [`LogGuard`] must be held until exit so buffered lines are
//! flushed.

use std::fs;
use std::path::Path;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log file path: {0}")]
    InvalidPath(String),

    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Keeps the file writer alive. Dropping it flushes pending lines.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<LogGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::new(Rfc3339))
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LogGuard { _file: guard })
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
