//! Common utilities shared across CLI commands.

use std::path::Path;

use fencewatch::config::ConfigFile;

use crate::error::CliError;

/// Load the configuration file, falling back to defaults when absent.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    let config = ConfigFile::load_from(path)?;
    tracing::debug!(path = %path.display(), exists = path.exists(), "Configuration loaded");
    Ok(config)
}
