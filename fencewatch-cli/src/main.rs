//! FenceWatch CLI - Command-line interface
//!
//! Runs the detection loop and provides helpers for configuring and testing
//! a deployment (pin service, distance producer, config file).

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::actuator::ActuatorCommands;
use commands::config::ConfigCommands;
use commands::run::RunArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "fencewatch")]
#[command(version, about = "Proximity-gated animal intrusion alarm", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the detection loop with the distance listener
    Run {
        /// Proximity threshold in cm (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Telemetry listener port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Alarm output pin (overrides config)
        #[arg(long)]
        output_id: Option<u8>,
    },

    /// Send a single command to the alarm pin service
    Actuator {
        #[command(subcommand)]
        command: ActuatorCommands,

        /// Alarm output pin (overrides config)
        #[arg(long, global = true)]
        output_id: Option<u8>,
    },

    /// Stream distance readings from stdin to a running listener
    SendDistance {
        /// Listener address (defaults to 127.0.0.1 and the configured port)
        #[arg(long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match fencewatch::logging::init_logging(cli.verbose, cli.log_file.as_deref())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", CliError::from(e));
            return ExitCode::FAILURE;
        }
    };

    match dispatch(cli.command, cli.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config_path = config_path.unwrap_or_else(fencewatch::config::config_file_path);

    match command {
        Commands::Run {
            threshold,
            port,
            output_id,
        } => commands::run::run(
            &config_path,
            RunArgs {
                threshold,
                port,
                output_id,
            },
        ),
        Commands::Actuator { command, output_id } => {
            commands::actuator::run(&config_path, command, output_id)
        }
        Commands::SendDistance { addr } => commands::send_distance::run(&config_path, addr),
        Commands::Config { command } => commands::config::run(&config_path, command),
        Commands::Init { force } => commands::init::run(&config_path, force),
    }
}
