//! Detection cadence and proximity gating.
//!
//! Classification is the expensive step of every loop iteration, so it runs
//! at most once per sampling interval and only while something is close to
//! the ranging sensor.
//!
//! ```text
//! elapsed < interval ────────────────► Skip        (frame dropped)
//! elapsed ≥ interval, distance ≥ thr ─► Gated       (sample point, no classifier)
//! elapsed ≥ interval, distance < thr ─► Classify    (sample point, run classifier)
//! ```
//!
//! Every sample point resets the interval, whether or not the classifier ran,
//! so the cadence stays periodic regardless of classifier cost.

use std::time::{Duration, Instant};

/// Default time between sample points.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(500);

/// Default proximity threshold in centimeters.
pub const DEFAULT_PROXIMITY_THRESHOLD_CM: f64 = 50.0;

/// Outcome of polling the scheduler for one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleDecision {
    /// Interval has not elapsed; nothing happens this iteration.
    Skip,
    /// Sample point, but the reading is at or beyond the threshold.
    Gated { distance_cm: f64 },
    /// Sample point with the target in range; run the classifier.
    Classify { distance_cm: f64 },
}

impl SampleDecision {
    /// Whether this iteration counts as a sample point.
    pub fn is_sample_point(&self) -> bool {
        !matches!(self, SampleDecision::Skip)
    }

    /// Whether the classifier should run.
    pub fn should_classify(&self) -> bool {
        matches!(self, SampleDecision::Classify { .. })
    }
}

/// Enforces the sampling interval and proximity gate.
#[derive(Debug, Clone)]
pub struct SamplingScheduler {
    interval: Duration,
    proximity_threshold_cm: f64,
    last_sample: Instant,
}

impl SamplingScheduler {
    /// Create a scheduler whose first sample point is one interval after
    /// `started_at`.
    pub fn new(interval: Duration, proximity_threshold_cm: f64, started_at: Instant) -> Self {
        Self {
            interval,
            proximity_threshold_cm,
            last_sample: started_at,
        }
    }

    /// Decide what this iteration does, given the current reading.
    pub fn poll(&mut self, now: Instant, distance_cm: f64) -> SampleDecision {
        if now.saturating_duration_since(self.last_sample) < self.interval {
            return SampleDecision::Skip;
        }

        self.last_sample = now;

        if distance_cm < self.proximity_threshold_cm {
            SampleDecision::Classify { distance_cm }
        } else {
            SampleDecision::Gated { distance_cm }
        }
    }

    /// Time of the most recent sample point (or the start time).
    pub fn last_sample(&self) -> Instant {
        self.last_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scheduler(start: Instant) -> SamplingScheduler {
        SamplingScheduler::new(
            DEFAULT_SAMPLING_INTERVAL,
            DEFAULT_PROXIMITY_THRESHOLD_CM,
            start,
        )
    }

    #[test]
    fn test_skips_before_interval() {
        let start = Instant::now();
        let mut s = scheduler(start);

        assert_eq!(
            s.poll(start + Duration::from_millis(499), 10.0),
            SampleDecision::Skip
        );
        assert_eq!(s.last_sample(), start);
    }

    #[test]
    fn test_classifies_when_close() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let now = start + Duration::from_millis(500);

        let decision = s.poll(now, 40.0);
        assert_eq!(decision, SampleDecision::Classify { distance_cm: 40.0 });
        assert!(decision.should_classify());
        assert_eq!(s.last_sample(), now);
    }

    #[test]
    fn test_gated_sample_point_still_resets_interval() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let first = start + Duration::from_millis(600);

        let decision = s.poll(first, 80.0);
        assert_eq!(decision, SampleDecision::Gated { distance_cm: 80.0 });
        assert!(decision.is_sample_point());
        assert!(!decision.should_classify());
        assert_eq!(s.last_sample(), first);

        // Target moves close right after; still has to wait a full interval.
        assert_eq!(
            s.poll(first + Duration::from_millis(100), 10.0),
            SampleDecision::Skip
        );
        assert!(s
            .poll(first + Duration::from_millis(500), 10.0)
            .should_classify());
    }

    #[test]
    fn test_threshold_boundary_is_gated() {
        let start = Instant::now();
        let mut s = scheduler(start);
        assert_eq!(
            s.poll(start + Duration::from_secs(1), 50.0),
            SampleDecision::Gated { distance_cm: 50.0 }
        );
    }

    #[test]
    fn test_clock_going_backwards_skips() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut s = scheduler(start);
        assert_eq!(s.poll(Instant::now(), 1.0), SampleDecision::Skip);
    }

    proptest! {
        #[test]
        fn prop_classify_iff_elapsed_and_close(
            elapsed_ms in 0u64..2_000,
            distance in 0.0f64..200.0,
        ) {
            let start = Instant::now();
            let mut s = scheduler(start);
            let decision = s.poll(start + Duration::from_millis(elapsed_ms), distance);

            let expected = elapsed_ms >= 500 && distance < 50.0;
            prop_assert_eq!(decision.should_classify(), expected);
            prop_assert_eq!(decision.is_sample_point(), elapsed_ms >= 500);
        }
    }
}
