//! Lock-free shared distance cell.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Reading reported before the sensor has sent anything.
///
/// Large enough to keep the proximity gate closed until real telemetry
/// arrives.
pub const DEFAULT_DISTANCE_CM: f64 = 999.0;

/// Most recent distance reading in centimeters.
///
/// The value is stored as raw `f64` bits in an [`AtomicU64`], so a reader
/// always observes either the previous or the new reading, never a mix.
/// Cloning shares the same cell.
///
/// The listener is the only writer and the orchestrator the only reader.
/// Staleness is acceptable, so no ordering beyond the single atomic word
/// is enforced.
#[derive(Clone, Debug)]
pub struct SharedDistance {
    bits: Arc<AtomicU64>,
}

impl SharedDistance {
    /// Create a cell holding [`DEFAULT_DISTANCE_CM`].
    pub fn new() -> Self {
        Self::with_initial(DEFAULT_DISTANCE_CM)
    }

    /// Create a cell holding the given reading.
    pub fn with_initial(cm: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(cm.to_bits())),
        }
    }

    /// Latest reading in centimeters.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Overwrite the reading (last write wins).
    pub fn set(&self, cm: f64) {
        self.bits.store(cm.to_bits(), Ordering::Release);
    }

    /// Whether the latest reading is strictly below `threshold_cm`.
    pub fn is_within(&self, threshold_cm: f64) -> bool {
        self.get() < threshold_cm
    }
}

impl Default for SharedDistance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_default_is_sentinel() {
        let cell = SharedDistance::new();
        assert_eq!(cell.get(), DEFAULT_DISTANCE_CM);
        assert!(!cell.is_within(50.0));
    }

    #[test]
    fn test_set_overwrites() {
        let cell = SharedDistance::new();
        cell.set(42.5);
        assert_eq!(cell.get(), 42.5);
        cell.set(120.0);
        assert_eq!(cell.get(), 120.0);
    }

    #[test]
    fn test_clones_share_cell() {
        let writer = SharedDistance::new();
        let reader = writer.clone();
        writer.set(12.0);
        assert_eq!(reader.get(), 12.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let cell = SharedDistance::with_initial(50.0);
        assert!(!cell.is_within(50.0));
        cell.set(49.99);
        assert!(cell.is_within(50.0));
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        let cell = SharedDistance::with_initial(1.0);
        let writer = cell.clone();

        let handle = thread::spawn(move || {
            for i in 0..10_000 {
                let value = if i % 2 == 0 { 1.0 } else { 123_456.789 };
                writer.set(value);
            }
        });

        for _ in 0..10_000 {
            let value = cell.get();
            assert!(value == 1.0 || value == 123_456.789, "torn read: {}", value);
        }

        handle.join().unwrap();
    }
}
