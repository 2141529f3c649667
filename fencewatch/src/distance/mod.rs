//! Distance telemetry from the ultrasonic ranging sensor.
//!
//! A single producer (the sensor host) connects over TCP and streams one
//! reading per line. The [`DistanceListener`] parses those lines and
//! overwrites the [`SharedDistance`] cell, which the orchestrator loop reads
//! on every iteration.
//!
//! # Example
//!
//! ```ignore
//! use fencewatch::distance::{DistanceListener, SharedDistance};
//! use tokio_util::sync::CancellationToken;
//!
//! let distance = SharedDistance::new();
//! let shutdown = CancellationToken::new();
//!
//! let listener = DistanceListener::bind("0.0.0.0:5000".parse()?).await?;
//! let handle = tokio::spawn(listener.run(distance.clone(), shutdown.clone()));
//!
//! // ... later
//! shutdown.cancel();
//! handle.await?;
//! ```

mod cell;
mod listener;

pub use cell::{SharedDistance, DEFAULT_DISTANCE_CM};
pub use listener::{
    parse_reading, DistanceListener, ListenerError, ListenerExit, ReadingParseError,
    MAX_LINE_BYTES,
};
