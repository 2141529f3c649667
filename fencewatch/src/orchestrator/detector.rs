//! The foreground detection loop.
//!
//! # Cycle
//!
//! ```text
//! next_frame ──fail──► skip (retry immediately)
//!     │
//!     ▼
//! poll auto-off ──► scheduler ──Skip/Gated──► done
//!                       │
//!                    Classify
//!                       ▼
//!               classify ──► synthesize ──► dispatch (each alert)
//!                       │
//!                       ▼
//!        alerts > 0 && distance < threshold ──► trigger alarm
//! ```
//!
//! Timing is driven by the `now` passed to [`DetectionOrchestrator::tick`],
//! so tests can step through cycles without sleeping.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{Collaborators, CycleReport, DetectorConfig};
use crate::actuator::{ActuatorController, ActuatorTransition};
use crate::alert::{AlertSink, AlertSynthesizer};
use crate::distance::SharedDistance;
use crate::metrics::DetectorMetrics;
use crate::sampling::{SampleDecision, SamplingScheduler};
use crate::vision::{Classifier, FrameSource};

/// Runs detection cycles against injected collaborators.
pub struct DetectionOrchestrator {
    config: DetectorConfig,
    distance: SharedDistance,
    frames: Box<dyn FrameSource>,
    classifier: Box<dyn Classifier>,
    synthesizer: AlertSynthesizer,
    alerts: Box<dyn AlertSink>,
    actuator: ActuatorController,
    scheduler: SamplingScheduler,
    metrics: Arc<DetectorMetrics>,
}

impl DetectionOrchestrator {
    pub fn new(
        config: DetectorConfig,
        distance: SharedDistance,
        collaborators: Collaborators,
        synthesizer: AlertSynthesizer,
    ) -> Self {
        let actuator =
            ActuatorController::new(collaborators.actuator, config.output_id, config.auto_off);
        let scheduler = SamplingScheduler::new(
            config.sampling_interval,
            config.proximity_threshold_cm,
            Instant::now(),
        );

        Self {
            config,
            distance,
            frames: collaborators.frames,
            classifier: collaborators.classifier,
            synthesizer,
            alerts: collaborators.alerts,
            actuator,
            scheduler,
            metrics: Arc::new(DetectorMetrics::new()),
        }
    }

    /// Share counters with the caller (e.g. for a shutdown summary).
    pub fn metrics(&self) -> Arc<DetectorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn actuator(&self) -> &ActuatorController {
        &self.actuator
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Forces the alarm off on entry and exit, then releases the frame
    /// source.
    pub fn run(&mut self, shutdown: &CancellationToken) {
        info!(
            threshold_cm = self.config.proximity_threshold_cm,
            interval_ms = self.config.sampling_interval.as_millis() as u64,
            output = self.config.output_id,
            "Detection loop started"
        );
        self.start(Instant::now());

        while !shutdown.is_cancelled() {
            let report = self.tick(Instant::now());
            if report.is_sample_point() && !self.config.loop_pause.is_zero() {
                thread::sleep(self.config.loop_pause);
            }
        }

        self.stop();
        info!("Detection loop stopped");
    }

    /// Reset sampling to `now` and force the alarm off.
    pub fn start(&mut self, now: Instant) {
        self.scheduler = SamplingScheduler::new(
            self.config.sampling_interval,
            self.config.proximity_threshold_cm,
            now,
        );
        self.force_off();
    }

    /// Force the alarm off and release the frame source.
    pub fn stop(&mut self) {
        self.force_off();
        self.frames.release();
    }

    /// Execute one loop iteration at `now`.
    pub fn tick(&mut self, now: Instant) -> CycleReport {
        let frame = match self.frames.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics.frame_failed();
                debug!(error = %e, "Frame unavailable, retrying");
                return CycleReport::frame_unavailable();
            }
        };
        self.metrics.frame_received();

        let auto_off = self.poll_auto_off(now);

        let decision = self.scheduler.poll(now, self.distance.get());
        let mut report = CycleReport::new(decision);
        report.auto_off = auto_off;

        if decision.is_sample_point() {
            self.metrics.sample_point();
        }

        let SampleDecision::Classify { distance_cm } = decision else {
            return report;
        };

        let detections = match self.classifier.classify(&frame, self.config.confidence_floor) {
            Ok(detections) => {
                self.metrics.classifier_ran(detections.len());
                detections
            }
            Err(e) => {
                self.metrics.classifier_failed();
                warn!(error = %e, "Classification failed");
                Vec::new()
            }
        };
        report.detections = detections.len();

        for detection in &detections {
            let Some(alert) = self.synthesizer.synthesize(detection) else {
                continue;
            };
            self.metrics.alert_synthesized();

            info!(
                animal = %alert.animal_type,
                severity = %alert.severity,
                confidence = alert.confidence,
                distance_cm,
                "Intrusion detected"
            );

            match self.alerts.send(&alert) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    self.metrics.dispatch_failed();
                    warn!(error = %e, "Alert delivery failed");
                }
            }
            report.alerts.push(alert);
        }

        // Re-read: the target may have moved away while classifying.
        if !report.alerts.is_empty() && self.distance.is_within(self.config.proximity_threshold_cm)
        {
            report.trigger = self.trigger(now);
        }

        report
    }

    fn poll_auto_off(&mut self, now: Instant) -> Option<ActuatorTransition> {
        if !self.actuator.is_on() {
            return None;
        }

        match self.actuator.poll_auto_off(now) {
            Ok(Some(transition)) => {
                self.metrics.actuator_command(true);
                Some(transition)
            }
            Ok(None) => None,
            Err(e) => {
                self.metrics.actuator_command(false);
                warn!(error = %e, "Alarm auto-off failed");
                None
            }
        }
    }

    fn trigger(&mut self, now: Instant) -> Option<ActuatorTransition> {
        match self.actuator.trigger(now) {
            Ok(transition) => {
                self.metrics.actuator_command(true);
                if transition == ActuatorTransition::SwitchedOn {
                    self.metrics.alarm_activated();
                }
                Some(transition)
            }
            Err(e) => {
                self.metrics.actuator_command(false);
                warn!(error = %e, "Alarm trigger failed");
                None
            }
        }
    }

    fn force_off(&mut self) {
        match self.actuator.force_off() {
            Ok(_) => self.metrics.actuator_command(true),
            Err(e) => {
                self.metrics.actuator_command(false);
                warn!(error = %e, "Failed to force alarm off");
            }
        }
    }
}
