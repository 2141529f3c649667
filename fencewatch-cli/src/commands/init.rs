//! Init command - initialize configuration file.

use std::path::Path;

use fencewatch::config::ConfigFile;

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: &Path, force: bool) -> Result<(), CliError> {
    if config_path.exists() && !force {
        println!("Configuration file already exists:");
        println!("  {}", config_path.display());
        println!();
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(config_path)?;

    println!("Configuration file: {}", config_path.display());
    println!();
    println!("Edit this file to set the camera, classifier, collector and pin service URLs.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
