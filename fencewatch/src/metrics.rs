//! Session counters for the detection loop.
//!
//! Lock-free atomic counters updated by the orchestrator, with a
//! point-in-time [`MetricsSnapshot`] for the shutdown summary.
//!
//! ```text
//! DetectionOrchestrator ─────► DetectorMetrics ─────► MetricsSnapshot ─────► CLI summary
//!                              (atomic counters)      (plain copy)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for one detection session.
#[derive(Debug)]
pub struct DetectorMetrics {
    started_at: Instant,
    frames: AtomicU64,
    frame_failures: AtomicU64,
    sample_points: AtomicU64,
    classifier_runs: AtomicU64,
    classifier_failures: AtomicU64,
    detections: AtomicU64,
    alerts: AtomicU64,
    dispatch_failures: AtomicU64,
    actuator_commands: AtomicU64,
    actuator_failures: AtomicU64,
    alarm_activations: AtomicU64,
}

impl DetectorMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames: AtomicU64::new(0),
            frame_failures: AtomicU64::new(0),
            sample_points: AtomicU64::new(0),
            classifier_runs: AtomicU64::new(0),
            classifier_failures: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            actuator_commands: AtomicU64::new(0),
            actuator_failures: AtomicU64::new(0),
            alarm_activations: AtomicU64::new(0),
        }
    }

    pub fn frame_received(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_failed(&self) {
        self.frame_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_point(&self) {
        self.sample_points.fetch_add(1, Ordering::Relaxed);
    }

    pub fn classifier_ran(&self, detections: usize) {
        self.classifier_runs.fetch_add(1, Ordering::Relaxed);
        self.detections
            .fetch_add(detections as u64, Ordering::Relaxed);
    }

    pub fn classifier_failed(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alert_synthesized(&self) {
        self.alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatch_failed(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one actuator command and whether it succeeded.
    pub fn actuator_command(&self, ok: bool) {
        self.actuator_commands.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.actuator_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn alarm_activated(&self) {
        self.alarm_activations.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            frames: self.frames.load(Ordering::Relaxed),
            frame_failures: self.frame_failures.load(Ordering::Relaxed),
            sample_points: self.sample_points.load(Ordering::Relaxed),
            classifier_runs: self.classifier_runs.load(Ordering::Relaxed),
            classifier_failures: self.classifier_failures.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            actuator_commands: self.actuator_commands.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
            alarm_activations: self.alarm_activations.load(Ordering::Relaxed),
        }
    }
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`DetectorMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub frames: u64,
    pub frame_failures: u64,
    pub sample_points: u64,
    pub classifier_runs: u64,
    pub classifier_failures: u64,
    pub detections: u64,
    pub alerts: u64,
    pub dispatch_failures: u64,
    pub actuator_commands: u64,
    pub actuator_failures: u64,
    pub alarm_activations: u64,
}

impl MetricsSnapshot {
    /// Alerts that reached the collector.
    pub fn alerts_delivered(&self) -> u64 {
        self.alerts.saturating_sub(self.dispatch_failures)
    }

    /// Average frames per second over the session.
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    /// Uptime as `1h 02m 03s`, `2m 03s` or `3s`.
    pub fn uptime_human(&self) -> String {
        let total = self.uptime.as_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{}h {:02}m {:02}s", h, m, s)
        } else if m > 0 {
            format!("{}m {:02}s", m, s)
        } else {
            format!("{}s", s)
        }
    }
}
