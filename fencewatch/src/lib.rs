//! FenceWatch - proximity-gated animal intrusion alarm
//!
//! This library watches a pasture camera feed, gates expensive object
//! classification on readings from an ultrasonic ranging sensor, and raises
//! an alarm through a pin-control service when an animal is detected close
//! to the fence. Every detection is also forwarded as an alert record to a
//! remote collector.
//!
//! # Architecture
//!
//! ```text
//!  Distance producer ──TCP──► DistanceListener ──► SharedDistance
//!                                                      │ (atomic cell)
//!                                                      ▼
//!  FrameSource ──► DetectionOrchestrator ──► SamplingScheduler ──► Classifier
//!                        │                                            │
//!                        │◄──────────── detections ───────────────────┘
//!                        ▼
//!                  AlertSynthesizer ──► AlertSink (collector)
//!                        │
//!                        ▼
//!                  ActuatorController ──► ActuatorService (pin server)
//! ```
//!
//! The listener runs on a tokio runtime; the orchestrator loop is a plain
//! blocking loop on the caller's thread. The only state the two share is
//! the [`distance::SharedDistance`] cell.

pub mod actuator;
pub mod alert;
pub mod config;
pub mod distance;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod sampling;
pub mod vision;

/// Crate version, used in startup banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
