//! Client for the pin-control web service.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{post_json, HttpClient, HttpError, ReqwestClient};

/// Default BCM pin wired to the buzzer.
pub const DEFAULT_OUTPUT_ID: u8 = 17;

/// Default timeout for a pin command.
pub const DEFAULT_ACTUATOR_TIMEOUT: Duration = Duration::from_secs(2);

/// A pin command that did not take effect.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The request itself failed.
    #[error("output {output_id} -> {}: {source}", on_off(.on))]
    Request {
        output_id: u8,
        on: bool,
        #[source]
        source: HttpError,
    },

    /// The service answered but reported the pin as failed.
    #[error("output {output_id} -> {}: rejected by service: {message}", on_off(.on))]
    Rejected {
        output_id: u8,
        on: bool,
        message: String,
    },
}

fn on_off(on: &bool) -> &'static str {
    if *on {
        "ON"
    } else {
        "OFF"
    }
}

/// Capability to set a digital output on the alarm hardware.
pub trait ActuatorService: Send {
    /// Drive `output_id` high (`true`) or low (`false`).
    ///
    /// `Ok` means the service confirmed the new state.
    fn set_output(&self, output_id: u8, on: bool) -> Result<(), ActuatorError>;
}

/// Request body: `{"pins": [{"pin": 17, "state": true}]}`.
#[derive(Debug, Serialize)]
struct OutputCommand {
    #[serde(rename = "pins")]
    outputs: Vec<OutputState>,
}

#[derive(Debug, Serialize)]
struct OutputState {
    #[serde(rename = "pin")]
    id: u8,
    state: bool,
}

/// One entry of the service's per-pin reply.
#[derive(Debug, Deserialize)]
struct OutputReply {
    pin: u8,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// [`ActuatorService`] backed by the HTTP pin-control API.
pub struct HttpActuator {
    url: String,
    client: Arc<dyn HttpClient>,
}

impl HttpActuator {
    /// Actuator at `url` (e.g. `http://pi:8000/gpio/pins`).
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
}

impl ActuatorService for HttpActuator {
    fn set_output(&self, output_id: u8, on: bool) -> Result<(), ActuatorError> {
        let command = OutputCommand {
            outputs: vec![OutputState {
                id: output_id,
                state: on,
            }],
        };

        let body = post_json(self.client.as_ref(), &self.url, &command).map_err(|source| {
            ActuatorError::Request {
                output_id,
                on,
                source,
            }
        })?;

        // Older firmware replies with an empty or non-list body; a success
        // status is all we get there.
        let Ok(replies) = serde_json::from_slice::<Vec<OutputReply>>(&body) else {
            return Ok(());
        };

        match replies
            .into_iter()
            .find(|r| r.pin == output_id && r.status.as_deref() == Some("error"))
        {
            Some(reply) => Err(ActuatorError::Rejected {
                output_id,
                on,
                message: reply.message.unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;

    #[test]
    fn test_command_body() {
        let mock = Arc::new(MockHttpClient::ok(b"[]"));
        let actuator = HttpActuator::with_client("http://pi:8000/gpio/pins", mock.clone());

        actuator.set_output(17, true).unwrap();
        actuator.set_output(17, false).unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].json(),
            serde_json::json!({"pins": [{"pin": 17, "state": true}]})
        );
        assert_eq!(
            requests[1].json(),
            serde_json::json!({"pins": [{"pin": 17, "state": false}]})
        );
    }

    #[test]
    fn test_success_reply() {
        let reply = br#"[{"pin": 17, "state": true, "status": "success", "message": "Pin 17 set to HIGH"}]"#;
        let mock = Arc::new(MockHttpClient::ok(reply));
        let actuator = HttpActuator::with_client("http://pi/gpio/pins", mock);
        assert!(actuator.set_output(17, true).is_ok());
    }

    #[test]
    fn test_error_reply_is_rejected() {
        let reply = br#"[{"pin": 17, "state": true, "status": "error", "message": "Failed to control pin 17"}]"#;
        let mock = Arc::new(MockHttpClient::ok(reply));
        let actuator = HttpActuator::with_client("http://pi/gpio/pins", mock);

        let err = actuator.set_output(17, true).unwrap_err();
        assert!(matches!(err, ActuatorError::Rejected { output_id: 17, on: true, .. }));
        assert!(err.to_string().contains("Failed to control pin 17"));
    }

    #[test]
    fn test_non_list_reply_counts_as_success() {
        let mock = Arc::new(MockHttpClient::ok(b"OK"));
        let actuator = HttpActuator::with_client("http://pi/gpio/pins", mock);
        assert!(actuator.set_output(4, false).is_ok());
    }

    #[test]
    fn test_transport_failure() {
        let mock = Arc::new(MockHttpClient::failing(HttpError::Timeout {
            url: "http://pi/gpio/pins".to_string(),
        }));
        let actuator = HttpActuator::with_client("http://pi/gpio/pins", mock);

        let err = actuator.set_output(17, false).unwrap_err();
        assert!(matches!(err, ActuatorError::Request { on: false, .. }));
        assert!(err.to_string().starts_with("output 17 -> OFF"));
    }
}
