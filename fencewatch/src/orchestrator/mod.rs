//! Detection loop orchestration
//!
//! Ties the frame source, sampling scheduler, classifier, alert synthesizer,
//! alert sink and actuator controller into the foreground detection loop.
//! Every collaborator failure is logged here once and the loop moves on;
//! nothing short of the shutdown signal stops it.

mod detector;
mod types;

pub use detector::DetectionOrchestrator;
pub use types::{Collaborators, CycleReport, DetectorConfig, DEFAULT_LOOP_PAUSE};
