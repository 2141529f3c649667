//! Actuator commands - drive the alarm pin directly.
//!
//! Useful for checking the wiring and the pin service before running the
//! detection loop.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use clap::Subcommand;

use fencewatch::actuator::{ActuatorController, ActuatorService, HttpActuator};
use fencewatch::config::ConfigFile;

use super::common::load_config;
use crate::error::CliError;

/// Actuator subcommands.
#[derive(Debug, Subcommand)]
pub enum ActuatorCommands {
    /// Switch the alarm on
    On,

    /// Switch the alarm off
    Off,

    /// Switch the alarm on, wait, then switch it off
    Pulse {
        /// How long to keep the alarm on
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
}

/// Run an actuator subcommand.
pub fn run(
    config_path: &Path,
    command: ActuatorCommands,
    output_id: Option<u8>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let output_id = output_id.unwrap_or(config.actuator.output_id);
    let service = http_actuator(&config)?;

    println!("Pin service: {}", service.url());

    match command {
        ActuatorCommands::On => {
            service.set_output(output_id, true)?;
            println!("Pin {} -> ON", output_id);
        }
        ActuatorCommands::Off => {
            service.set_output(output_id, false)?;
            println!("Pin {} -> OFF", output_id);
        }
        ActuatorCommands::Pulse { duration_ms } => {
            pulse(Box::new(service), output_id, Duration::from_millis(duration_ms))?;
        }
    }

    Ok(())
}

fn http_actuator(config: &ConfigFile) -> Result<HttpActuator, CliError> {
    Ok(HttpActuator::new(
        config.actuator.url.clone(),
        Duration::from_secs(config.actuator.timeout_secs),
    )?)
}

/// Drive the alarm through the same state machine the loop uses.
fn pulse(
    service: Box<dyn ActuatorService>,
    output_id: u8,
    duration: Duration,
) -> Result<(), CliError> {
    let mut controller = ActuatorController::new(service, output_id, duration);

    controller.trigger(Instant::now())?;
    println!("Pin {} -> ON for {} ms", output_id, duration.as_millis());

    thread::sleep(duration);

    if controller.poll_auto_off(Instant::now())?.is_none() {
        controller.force_off()?;
    }
    println!("Pin {} -> OFF", output_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fencewatch::actuator::ActuatorError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(u8, bool)>>>);

    impl ActuatorService for Recorder {
        fn set_output(&self, output_id: u8, on: bool) -> Result<(), ActuatorError> {
            self.0.lock().unwrap().push((output_id, on));
            Ok(())
        }
    }

    #[test]
    fn test_pulse_switches_on_then_off() {
        let recorder = Recorder::default();
        pulse(Box::new(recorder.clone()), 5, Duration::from_millis(10)).unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![(5, true), (5, false)]);
    }
}
