//! Best-effort alert delivery to the remote collector.
//!
//! Delivery is at-most-once: one POST per alert, no retry, no queue. A
//! failed send is reported to the caller and the alert is gone.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::types::AlertEvent;
use crate::http::{post_json, HttpClient, HttpError, ReqwestClient};

/// Default timeout for a collector request.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Error delivering a single alert.
#[derive(Debug, Error)]
#[error("failed to deliver {animal_type} alert: {source}")]
pub struct DispatchError {
    pub animal_type: String,
    #[source]
    pub source: HttpError,
}

/// Destination for synthesized alerts.
pub trait AlertSink: Send {
    /// Deliver one alert. Called exactly once per alert.
    fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError>;
}

/// Posts alerts as JSON to the collector API.
pub struct HttpAlertCollector {
    url: String,
    client: Arc<dyn HttpClient>,
}

impl HttpAlertCollector {
    /// Collector at `url` with a reqwest client bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, HttpError> {
        let client = ReqwestClient::with_timeout(timeout)?;
        Ok(Self::with_client(url, Arc::new(client)))
    }

    /// Collector using an existing HTTP client.
    pub fn with_client(url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AlertSink for HttpAlertCollector {
    fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError> {
        post_json(self.client.as_ref(), &self.url, alert)
            .map(|_| ())
            .map_err(|source| DispatchError {
                animal_type: alert.animal_type.clone(),
                source,
            })
    }
}
