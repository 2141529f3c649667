//! HTTP client abstraction for testability
//!
//! The actuator, alert collector, and classifier adapters all talk HTTP with
//! short timeouts. They go through [`HttpClient`] so tests can swap in
//! `MockHttpClient` and inspect what would have been sent.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Content type for JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors from a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Building the client failed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Could not connect to the remote host.
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs a blocking HTTP POST.
    ///
    /// Returns the response body when the status is a success, an error
    /// otherwise.
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError>;
}

/// Serialize `body` as JSON and POST it.
pub fn post_json<T: Serialize + ?Sized>(
    client: &dyn HttpClient,
    url: &str,
    body: &T,
) -> Result<Vec<u8>, HttpError> {
    let encoded = serde_json::to_vec(body).map_err(|e| HttpError::Encode(e.to_string()))?;
    client.post(url, JSON_CONTENT_TYPE, encoded)
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .map_err(|e| classify_error(url, e))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(HttpError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| classify_error(url, e))
    }
}

/// Map a reqwest error onto the coarser [`HttpError`] kinds.
pub(crate) fn classify_error(url: &str, error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        HttpError::Connect {
            url: url.to_string(),
            reason: error.to_string(),
        }
    } else {
        HttpError::Request(error.to_string())
    }
}

/// Request captured by [`MockHttpClient`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[cfg(test)]
impl RecordedRequest {
    /// Decode the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// Mock HTTP client for testing
///
/// Replies with a fixed result and records every request.
#[cfg(test)]
pub struct MockHttpClient {
    pub response: Result<Vec<u8>, HttpError>,
    pub requests: std::sync::Mutex<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn ok(body: &[u8]) -> Self {
        Self::with_response(Ok(body.to_vec()))
    }

    pub fn failing(error: HttpError) -> Self {
        Self::with_response(Err(error))
    }

    pub fn with_response(response: Result<Vec<u8>, HttpError>) -> Self {
        Self {
            response,
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl HttpClient for MockHttpClient {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::ok(b"{}");

        let result = mock.post("http://example.com", "text/plain", vec![1, 2, 3]);
        assert_eq!(result, Ok(b"{}".to_vec()));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, vec![1, 2, 3]);
    }

    #[test]
    fn test_mock_client_error() {
        let mock = MockHttpClient::failing(HttpError::Status {
            status: 500,
            url: "http://example.com".to_string(),
        });

        let result = mock.post("http://example.com", "text/plain", Vec::new());
        assert!(matches!(result, Err(HttpError::Status { status: 500, .. })));
    }

    #[test]
    fn test_post_json_sets_content_type() {
        let mock = MockHttpClient::ok(b"");
        post_json(&mock, "http://example.com/x", &serde_json::json!({"a": 1})).unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.content_type, JSON_CONTENT_TYPE);
        assert_eq!(request.json(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_unreachable_host_is_connect_or_timeout() {
        let client = ReqwestClient::with_timeout(Duration::from_millis(500)).unwrap();
        // Port 9 on localhost is almost never served.
        let result = client.post("http://127.0.0.1:9/", JSON_CONTENT_TYPE, b"{}".to_vec());
        assert!(matches!(
            result,
            Err(HttpError::Connect { .. }) | Err(HttpError::Timeout { .. }) | Err(HttpError::Request(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = HttpError::Timeout {
            url: "http://pi:8000/gpio/pins".to_string(),
        };
        assert_eq!(err.to_string(), "request to http://pi:8000/gpio/pins timed out");
    }
}
