//! Alert synthesis and delivery.
//!
//! Detections that pass the label allow-list become [`AlertEvent`]s with a
//! remapped confidence and a randomly nudged severity grade. Each event is
//! sent once to the collector through an [`AlertSink`].
//!
//! # Example
//!
//! ```ignore
//! use fencewatch::alert::{AlertSynthesizer, LabelPolicy, Location, SystemRandom};
//! use fencewatch::vision::Detection;
//!
//! let mut synth = AlertSynthesizer::new(
//!     LabelPolicy::default(),
//!     Location::default(),
//!     Box::new(SystemRandom::new()),
//! );
//! if let Some(alert) = synth.synthesize(&Detection::new("dog", 0.8)) {
//!     collector.send(&alert)?;
//! }
//! ```

mod dispatch;
mod labels;
mod random;
mod synthesizer;
mod types;

pub use dispatch::{AlertSink, DispatchError, HttpAlertCollector, DEFAULT_DISPATCH_TIMEOUT};
pub use labels::{
    ConfidenceRange, LabelPolicy, LabelProfile, DEFAULT_CONFIDENCE_RANGE, DEFAULT_SEVERITY,
};
pub use random::{RandomSource, ScriptedRandom, SystemRandom};
pub use synthesizer::{severity_offset, to_percentage, AlertSynthesizer, CONFIDENCE_JITTER};
pub use types::{AlertEvent, DetectionType, Location, Severity, UnknownSeverity};
