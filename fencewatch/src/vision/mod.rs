//! Camera frames and object classification.
//!
//! Both are external collaborators of the orchestrator. They are reached
//! through the [`FrameSource`] and [`Classifier`] traits so the loop can be
//! driven by fakes in tests. The shipped adapters are:
//!
//! - [`MjpegStream`]: pulls JPEG frames from an MJPEG-over-HTTP camera
//!   (ESP32-CAM style `/stream` endpoint).
//! - [`HttpClassifier`]: downsizes a frame and posts it to an inference
//!   service that returns labelled detections.

mod classifier;
mod mjpeg;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use classifier::{HttpClassifier, CLASSIFIER_INPUT_HEIGHT, CLASSIFIER_INPUT_WIDTH};
pub use mjpeg::{extract_jpeg, MjpegStream};

/// Default minimum classifier confidence.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.5;

/// One encoded camera frame (JPEG bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

/// A labelled object found in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Frame acquisition failures. All are transient from the loop's view.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Could not open the camera stream.
    #[error("failed to connect to camera at {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Stream ended or failed mid-frame.
    #[error("camera stream read failed: {0}")]
    Read(String),

    /// The stream produced a frame larger than allowed.
    #[error("frame exceeds {max} bytes")]
    Oversized { max: usize },
}

/// Classifier failures.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Frame could not be decoded or re-encoded.
    #[error("image processing failed: {0}")]
    Image(String),

    /// The inference service call failed.
    #[error("inference request failed: {0}")]
    Http(#[from] crate::http::HttpError),

    /// The inference response was not the expected JSON.
    #[error("invalid inference response: {0}")]
    Response(String),
}

/// Pull-based source of camera frames.
pub trait FrameSource: Send {
    /// Block until the next frame is available.
    ///
    /// An error means this attempt failed; the caller may simply try again.
    fn next_frame(&mut self) -> Result<Frame, FrameError>;

    /// Release the underlying device or connection.
    fn release(&mut self) {}
}

/// Object classifier over single frames.
pub trait Classifier: Send {
    /// Detect objects in `frame` whose confidence is at least
    /// `confidence_floor`. Order of the result is not significant.
    fn classify(
        &self,
        frame: &Frame,
        confidence_floor: f64,
    ) -> Result<Vec<Detection>, ClassifierError>;
}
