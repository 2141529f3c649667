//! Run command - detection loop plus distance listener.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fencewatch::actuator::HttpActuator;
use fencewatch::alert::{AlertSynthesizer, HttpAlertCollector, SystemRandom};
use fencewatch::config::ConfigFile;
use fencewatch::distance::{DistanceListener, ListenerExit, SharedDistance};
use fencewatch::metrics::MetricsSnapshot;
use fencewatch::orchestrator::{Collaborators, DetectionOrchestrator, DetectorConfig};
use fencewatch::vision::{HttpClassifier, MjpegStream};

use super::common::load_config;
use crate::error::CliError;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub threshold: Option<f64>,
    pub port: Option<u16>,
    pub output_id: Option<u8>,
}

/// Apply CLI overrides on top of the file configuration.
fn apply_overrides(config: &mut ConfigFile, args: &RunArgs) -> Result<(), CliError> {
    if let Some(threshold) = args.threshold {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(CliError::Config(format!(
                "--threshold must be a positive number of cm, got {}",
                threshold
            )));
        }
        config.detection.proximity_threshold_cm = threshold;
    }
    if let Some(port) = args.port {
        config.telemetry.port = port;
    }
    if let Some(output_id) = args.output_id {
        config.actuator.output_id = output_id;
    }
    Ok(())
}

/// Run the run command.
pub fn run(config_path: &Path, args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, &args)?;

    let bind_addr: SocketAddr = config.telemetry.socket_address().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid telemetry bind address '{}'",
            config.telemetry.socket_address()
        ))
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("fencewatch-telemetry")
        .enable_all()
        .build()?;

    let distance = SharedDistance::new();
    let shutdown = CancellationToken::new();

    let listener = runtime.block_on(DistanceListener::bind(bind_addr))?;
    let listening_on = listener.local_addr();
    let listener_task = runtime.spawn(listener.run(distance.clone(), shutdown.clone()));

    let collaborators = Collaborators {
        frames: Box::new(MjpegStream::new(
            config.camera.stream_url.clone(),
            Duration::from_secs(config.camera.timeout_secs),
        )?),
        classifier: Box::new(HttpClassifier::new(
            config.classifier.url.clone(),
            Duration::from_secs(config.classifier.timeout_secs),
        )?),
        alerts: Box::new(HttpAlertCollector::new(
            config.alerts.url.clone(),
            Duration::from_secs(config.alerts.timeout_secs),
        )?),
        actuator: Box::new(HttpActuator::new(
            config.actuator.url.clone(),
            Duration::from_secs(config.actuator.timeout_secs),
        )?),
    };

    let synthesizer = AlertSynthesizer::new(
        config.labels.clone(),
        config.alerts.location.clone(),
        Box::new(SystemRandom::new()),
    );

    let detector_config = DetectorConfig::from_config_file(&config);
    let mut orchestrator =
        DetectionOrchestrator::new(detector_config, distance, collaborators, synthesizer);
    let metrics = orchestrator.metrics();

    print_banner(&config, listening_on);

    let signal_token = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    orchestrator.run(&shutdown);

    // The listener may already have ended if the producer hung up.
    shutdown.cancel();
    match runtime.block_on(listener_task) {
        Ok(Ok(ListenerExit::Cancelled)) => info!("Distance listener stopped"),
        Ok(Ok(ListenerExit::ConnectionClosed { readings, rejected })) => {
            info!(readings, rejected, "Distance producer had disconnected")
        }
        Ok(Err(e)) => warn!(error = %e, "Distance listener failed"),
        Err(e) => warn!(error = %e, "Distance listener task panicked"),
    }

    print_summary(&metrics.snapshot());
    Ok(())
}

fn print_banner(config: &ConfigFile, listening_on: SocketAddr) {
    println!("FenceWatch v{}", fencewatch::VERSION);
    println!("================");
    println!();
    println!("Camera:      {}", config.camera.stream_url);
    println!("Classifier:  {}", config.classifier.url);
    println!("Collector:   {}", config.alerts.url);
    println!(
        "Alarm:       {} (pin {}, {} ms)",
        config.actuator.url, config.actuator.output_id, config.actuator.auto_off_ms
    );
    println!("Telemetry:   listening on {}", listening_on);
    println!(
        "Threshold:   {} cm, sampling every {} ms",
        config.detection.proximity_threshold_cm, config.detection.sampling_interval_ms
    );
    println!("Monitoring:  {}", config.labels.monitored_labels().join(", "));
    println!();
    println!("Press Ctrl+C to stop");
    println!();
}

fn print_summary(snapshot: &MetricsSnapshot) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Frames:       {} ({} failed, {:.1} fps)",
        snapshot.frames,
        snapshot.frame_failures,
        snapshot.frames_per_second()
    );
    println!(
        "  Classified:   {} of {} sample points ({} failed)",
        snapshot.classifier_runs, snapshot.sample_points, snapshot.classifier_failures
    );
    println!(
        "  Alerts:       {} ({} delivered)",
        snapshot.alerts,
        snapshot.alerts_delivered()
    );
    println!(
        "  Alarm:        {} activations, {} commands ({} failed)",
        snapshot.alarm_activations, snapshot.actuator_commands, snapshot.actuator_failures
    );
    println!("  Uptime:       {}", snapshot.uptime_human());
}
