//! Turns raw detections into graded alert records.
//!
//! Each monitored detection goes through two randomized transforms:
//!
//! 1. **Confidence remap** - the raw classifier score is stretched onto a
//!    label-specific range, nudged by up to ±0.02 and clamped to `[0, 1]`.
//!    Large or dangerous animals map onto higher ranges.
//! 2. **Severity grading** - the label's base severity is usually kept,
//!    sometimes raised or lowered by one grade, and rarely raised by two:
//!
//! ```text
//! r in [0.00, 0.05)  -> +2
//! r in [0.05, 0.20)  -> +1
//! r in [0.20, 0.25)  -> -1
//! r in [0.25, 1.00)  ->  0
//! ```
//!
//! Draws are taken from the injected [`RandomSource`] in that order: the
//! jitter first, then the severity draw.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use super::labels::LabelPolicy;
use super::random::RandomSource;
use super::types::{AlertEvent, DetectionType, Location};
use crate::vision::Detection;

/// Maximum absolute jitter added to the remapped confidence.
pub const CONFIDENCE_JITTER: f64 = 0.02;

/// Raw confidence assumed when the classifier reports a non-finite score.
const FALLBACK_RAW_CONFIDENCE: f64 = 0.5;

/// Severity offset for a uniform draw `r` in `[0, 1)`.
pub fn severity_offset(r: f64) -> i32 {
    if r < 0.05 {
        2
    } else if r < 0.20 {
        1
    } else if r < 0.25 {
        -1
    } else {
        0
    }
}

/// Convert a `[0, 1]` score into a percentage with one decimal place.
pub fn to_percentage(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

/// Builds [`AlertEvent`]s from detections.
pub struct AlertSynthesizer {
    policy: LabelPolicy,
    location: Location,
    random: Box<dyn RandomSource>,
}

impl AlertSynthesizer {
    pub fn new(policy: LabelPolicy, location: Location, random: Box<dyn RandomSource>) -> Self {
        Self {
            policy,
            location,
            random,
        }
    }

    /// Grade `detection`, stamped with the current time.
    ///
    /// Returns `None` when the label is not monitored.
    pub fn synthesize(&mut self, detection: &Detection) -> Option<AlertEvent> {
        self.synthesize_at(detection, Utc::now())
    }

    /// Grade `detection` with an explicit timestamp.
    pub fn synthesize_at(
        &mut self,
        detection: &Detection,
        at: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if !self.policy.is_monitored(&detection.label) {
            return None;
        }

        let raw = if detection.confidence.is_finite() {
            detection.confidence.clamp(0.0, 1.0)
        } else {
            FALLBACK_RAW_CONFIDENCE
        };

        let range = self.policy.confidence_range(&detection.label);
        let jitter = self.random.uniform(-CONFIDENCE_JITTER, CONFIDENCE_JITTER);
        let score = (range.map(raw) + jitter).clamp(0.0, 1.0);

        let base = self.policy.base_severity(&detection.label);
        let offset = severity_offset(self.random.next_unit());
        let severity = base.shifted(offset);

        let confidence = to_percentage(score);

        debug!(
            label = %detection.label,
            raw_confidence = raw,
            confidence,
            %base,
            offset,
            %severity,
            "Synthesized alert"
        );

        Some(AlertEvent {
            location: self.location.clone(),
            detection_type: DetectionType::Camera,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            severity,
            animal_type: detection.label.clone(),
            confidence,
            resolved: false,
        })
    }
}
