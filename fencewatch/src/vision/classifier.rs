//! HTTP inference adapter.
//!
//! Frames are downscaled to the model input size before upload; the camera
//! produces far more pixels than the detector uses.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;
use tracing::debug;

use super::{Classifier, ClassifierError, Detection, Frame};
use crate::http::{HttpClient, HttpError, ReqwestClient};

/// Width frames are resized to before inference.
pub const CLASSIFIER_INPUT_WIDTH: u32 = 320;

/// Height frames are resized to before inference.
pub const CLASSIFIER_INPUT_HEIGHT: u32 = 240;

const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Inference responses come either as a bare list or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    List(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

impl InferenceResponse {
    fn into_detections(self) -> Vec<Detection> {
        match self {
            InferenceResponse::List(d) => d,
            InferenceResponse::Wrapped { detections } => detections,
        }
    }
}

/// [`Classifier`] that posts a downscaled JPEG to an inference endpoint.
///
/// The endpoint receives the confidence floor as a `conf` query parameter
/// and answers with `[{"label": "dog", "confidence": 0.81}, ...]`.
pub struct HttpClassifier {
    url: String,
    client: Arc<dyn HttpClient>,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, HttpError> {
        let client = ReqwestClient::with_timeout(timeout)?;
        Ok(Self::with_client(url, Arc::new(client)))
    }

    pub fn with_client(url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_url(&self, confidence_floor: f64) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}conf={}", self.url, sep, confidence_floor)
    }
}

/// Decode `frame`, resize it to the model input size and re-encode as JPEG.
fn prepare_input(frame: &Frame) -> Result<Vec<u8>, ClassifierError> {
    let decoded = image::load_from_memory_with_format(&frame.data, ImageFormat::Jpeg)
        .map_err(|e| ClassifierError::Image(e.to_string()))?;

    let resized = decoded.resize_exact(
        CLASSIFIER_INPUT_WIDTH,
        CLASSIFIER_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(resized.to_rgb8())
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .map_err(|e| ClassifierError::Image(e.to_string()))?;
    Ok(encoded)
}

impl Classifier for HttpClassifier {
    fn classify(
        &self,
        frame: &Frame,
        confidence_floor: f64,
    ) -> Result<Vec<Detection>, ClassifierError> {
        let input = prepare_input(frame)?;
        let body = self
            .client
            .post(&self.request_url(confidence_floor), JPEG_CONTENT_TYPE, input)?;

        let response: InferenceResponse = serde_json::from_slice(&body)
            .map_err(|e| ClassifierError::Response(e.to_string()))?;

        // Not every service honours the floor.
        let detections: Vec<Detection> = response
            .into_detections()
            .into_iter()
            .filter(|d| d.confidence >= confidence_floor)
            .collect();

        debug!(count = detections.len(), "Classifier returned detections");
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use image::{GenericImageView, ImageBuffer, Rgb};

    fn test_frame(width: u32, height: u32) -> Frame {
        let img = ImageBuffer::from_pixel(width, height, Rgb([40u8, 120, 60]));
        let mut data = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Jpeg)
            .unwrap();
        Frame::new(data)
    }

    #[test]
    fn test_uploads_resized_jpeg() {
        let mock = Arc::new(MockHttpClient::ok(b"[]"));
        let classifier = HttpClassifier::with_client("http://infer:9000/detect", mock.clone());

        classifier.classify(&test_frame(640, 480), 0.5).unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://infer:9000/detect?conf=0.5");
        assert_eq!(requests[0].content_type, "image/jpeg");

        let uploaded = image::load_from_memory(&requests[0].body).unwrap();
        assert_eq!(
            uploaded.dimensions(),
            (CLASSIFIER_INPUT_WIDTH, CLASSIFIER_INPUT_HEIGHT)
        );
    }

    #[test]
    fn test_existing_query_is_extended() {
        let mock = Arc::new(MockHttpClient::ok(b"[]"));
        let classifier = HttpClassifier::with_client("http://infer/detect?model=n", mock.clone());
        classifier.classify(&test_frame(32, 24), 0.25).unwrap();
        assert_eq!(mock.requests()[0].url, "http://infer/detect?model=n&conf=0.25");
    }

    #[test]
    fn test_filters_below_floor() {
        let reply = br#"[{"label": "dog", "confidence": 0.81},
                        {"label": "cat", "confidence": 0.3},
                        {"label": "person", "confidence": 0.5}]"#;
        let classifier =
            HttpClassifier::with_client("http://infer/detect", Arc::new(MockHttpClient::ok(reply)));

        let detections = classifier.classify(&test_frame(64, 48), 0.5).unwrap();
        assert_eq!(
            detections,
            vec![Detection::new("dog", 0.81), Detection::new("person", 0.5)]
        );
    }

    #[test]
    fn test_wrapped_response() {
        let reply = br#"{"detections": [{"label": "bear", "confidence": 0.9}]}"#;
        let classifier =
            HttpClassifier::with_client("http://infer/detect", Arc::new(MockHttpClient::ok(reply)));

        let detections = classifier.classify(&test_frame(64, 48), 0.5).unwrap();
        assert_eq!(detections, vec![Detection::new("bear", 0.9)]);
    }

    #[test]
    fn test_bad_frame_is_image_error() {
        let mock = Arc::new(MockHttpClient::ok(b"[]"));
        let classifier = HttpClassifier::with_client("http://infer/detect", mock.clone());

        let err = classifier
            .classify(&Frame::new(vec![0xFF, 0xD8, 0x00, 0xFF, 0xD9]), 0.5)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Image(_)));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_garbage_response() {
        let classifier = HttpClassifier::with_client(
            "http://infer/detect",
            Arc::new(MockHttpClient::ok(b"<html>")),
        );
        let err = classifier.classify(&test_frame(64, 48), 0.5).unwrap_err();
        assert!(matches!(err, ClassifierError::Response(_)));
    }

    #[test]
    fn test_http_failure_propagates() {
        let classifier = HttpClassifier::with_client(
            "http://infer/detect",
            Arc::new(MockHttpClient::failing(HttpError::Status {
                status: 503,
                url: "http://infer/detect".to_string(),
            })),
        );
        let err = classifier.classify(&test_frame(64, 48), 0.5).unwrap_err();
        assert!(matches!(err, ClassifierError::Http(HttpError::Status { status: 503, .. })));
    }
}
