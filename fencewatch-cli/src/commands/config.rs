//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` commands
//! for viewing and modifying configuration settings from the command line.

use std::path::Path;

use clap::Subcommand;
use fencewatch::config::{ConfigFile, ConfigKey};

use super::common::load_config;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., actuator.output_id)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., actuator.output_id)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings, including label profiles
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(config_path: &Path, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(config_path, &key),
        ConfigCommands::Set { key, value } => run_set(config_path, &key, &value),
        ConfigCommands::List => run_list(config_path),
        ConfigCommands::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'fencewatch config list' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(config_path: &Path, key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load_config(config_path)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Set a configuration value.
fn run_set(config_path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let mut config = load_config(config_path)?;
    config_key.set(&mut config, value)?;
    config.save_to(config_path)?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));

    Ok(())
}

/// List all configuration settings.
fn run_list(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();
    print!("{}", render_settings(&config));

    Ok(())
}

/// Render all settings grouped by section.
fn render_settings(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();

        // Section header when section changes
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }

        let value = key.get(config);
        if value.is_empty() {
            out.push_str(&format!("  {} = (not set)\n", key.key_name()));
        } else {
            out.push_str(&format!("  {} = {}\n", key.key_name(), value));
        }
    }

    for (label, profile) in config.labels.profiles() {
        out.push_str(&format!("\n[label.{}]\n", label));
        out.push_str(&format!("  severity = {}\n", profile.severity));
        if let Some(range) = profile.confidence {
            out.push_str(&format!(
                "  confidence = {} - {}\n",
                range.low, range.high
            ));
        }
    }

    out
}
