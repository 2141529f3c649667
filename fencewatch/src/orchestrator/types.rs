//! Orchestrator configuration and per-cycle results

use std::time::Duration;

use crate::actuator::{
    ActuatorService, ActuatorTransition, DEFAULT_AUTO_OFF, DEFAULT_OUTPUT_ID,
};
use crate::alert::{AlertEvent, AlertSink};
use crate::config::ConfigFile;
use crate::sampling::{SampleDecision, DEFAULT_PROXIMITY_THRESHOLD_CM, DEFAULT_SAMPLING_INTERVAL};
use crate::vision::{Classifier, FrameSource, DEFAULT_CONFIDENCE_FLOOR};

/// Default pause after a sample point.
pub const DEFAULT_LOOP_PAUSE: Duration = Duration::from_millis(10);

/// Tunables for the detection loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Readings strictly below this gate classification and the alarm.
    pub proximity_threshold_cm: f64,
    pub sampling_interval: Duration,
    /// Minimum classifier confidence passed to the classifier.
    pub confidence_floor: f64,
    /// Sleep after each sample point.
    pub loop_pause: Duration,
    pub output_id: u8,
    /// Minimum time the alarm stays on.
    pub auto_off: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_cm: DEFAULT_PROXIMITY_THRESHOLD_CM,
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            loop_pause: DEFAULT_LOOP_PAUSE,
            output_id: DEFAULT_OUTPUT_ID,
            auto_off: DEFAULT_AUTO_OFF,
        }
    }
}

impl DetectorConfig {
    /// Extract loop settings from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            proximity_threshold_cm: config.detection.proximity_threshold_cm,
            sampling_interval: config.sampling_interval(),
            confidence_floor: config.detection.confidence_floor,
            loop_pause: config.loop_pause(),
            output_id: config.actuator.output_id,
            auto_off: config.auto_off(),
        }
    }
}

/// The external capabilities the loop drives.
pub struct Collaborators {
    pub frames: Box<dyn FrameSource>,
    pub classifier: Box<dyn Classifier>,
    pub alerts: Box<dyn AlertSink>,
    pub actuator: Box<dyn ActuatorService>,
}

/// What happened in one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// False when frame acquisition failed and the iteration was skipped.
    pub frame_acquired: bool,
    pub decision: SampleDecision,
    /// Detections returned by the classifier (before filtering).
    pub detections: usize,
    /// Alerts synthesized this cycle.
    pub alerts: Vec<AlertEvent>,
    /// Alerts the collector accepted.
    pub delivered: usize,
    /// Confirmed auto-off, if one happened.
    pub auto_off: Option<ActuatorTransition>,
    /// Confirmed trigger, if one happened.
    pub trigger: Option<ActuatorTransition>,
}

impl CycleReport {
    pub(super) fn new(decision: SampleDecision) -> Self {
        Self {
            frame_acquired: true,
            decision,
            detections: 0,
            alerts: Vec::new(),
            delivered: 0,
            auto_off: None,
            trigger: None,
        }
    }

    pub(super) fn frame_unavailable() -> Self {
        Self {
            frame_acquired: false,
            ..Self::new(SampleDecision::Skip)
        }
    }

    /// Whether the loop should pause after this cycle.
    pub fn is_sample_point(&self) -> bool {
        self.decision.is_sample_point()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.proximity_threshold_cm, 50.0);
        assert_eq!(config.sampling_interval, Duration::from_millis(500));
        assert_eq!(config.confidence_floor, 0.5);
        assert_eq!(config.loop_pause, Duration::from_millis(10));
        assert_eq!(config.output_id, 17);
        assert_eq!(config.auto_off, Duration::from_secs(1));
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.detection.proximity_threshold_cm = 30.0;
        file.detection.sampling_interval_ms = 200;
        file.actuator.output_id = 22;
        file.actuator.auto_off_ms = 2500;

        let config = DetectorConfig::from_config_file(&file);
        assert_eq!(config.proximity_threshold_cm, 30.0);
        assert_eq!(config.sampling_interval, Duration::from_millis(200));
        assert_eq!(config.output_id, 22);
        assert_eq!(config.auto_off, Duration::from_millis(2500));
        assert_eq!(config, DetectorConfig::from_config_file(&file));
    }

    #[test]
    fn test_frame_unavailable_report() {
        let report = CycleReport::frame_unavailable();
        assert!(!report.frame_acquired);
        assert!(!report.is_sample_point());
        assert!(report.alerts.is_empty());
    }
}
