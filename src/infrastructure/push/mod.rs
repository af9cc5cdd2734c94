//! Push Delivery Collaborator
//!
//! HTTP implementation of the `PushSender` trait against an FCM-style
//! endpoint, plus a no-op sender for deployments without push configured.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::application::services::{PushError, PushMessage, PushSender};
use crate::config::PushSettings;

/// FCM-style HTTP push sender.
pub struct HttpPushSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpPushSender {
    pub fn new(settings: &PushSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

/// Per-message result entry in the delivery response body.
#[derive(Debug, Deserialize)]
struct DeliveryResult {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeliveryResponse {
    #[serde(default)]
    results: Vec<DeliveryResult>,
}

/// Error strings the collaborator uses for dead tokens.
fn is_token_error(error: &str) -> bool {
    matches!(error, "NotRegistered" | "InvalidRegistration" | "MissingRegistration")
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, device_token: &str, push: &PushMessage) -> Result<(), PushError> {
        let body = json!({
            "to": device_token,
            "priority": "high",
            "notification": {
                "title": push.title,
                "body": push.body,
            },
            "data": {
                "linkId": push.link_id,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Delivery(format!(
                "push endpoint returned {}",
                status
            )));
        }

        // Token failures are reported per message inside a 200 response.
        let parsed: DeliveryResponse = response
            .json()
            .await
            .map_err(|e| PushError::Delivery(e.to_string()))?;

        if let Some(error) = parsed.results.iter().find_map(|r| r.error.as_deref()) {
            if is_token_error(error) {
                return Err(PushError::InvalidToken);
            }
            return Err(PushError::Delivery(error.to_string()));
        }

        Ok(())
    }
}

/// Sender used when push delivery is disabled by configuration. Notifications
/// are logged and dropped.
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn send(&self, _device_token: &str, push: &PushMessage) -> Result<(), PushError> {
        tracing::debug!(title = %push.title, "Push delivery disabled, dropping notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_token_errors_are_recognized() {
        assert!(is_token_error("NotRegistered"));
        assert!(is_token_error("InvalidRegistration"));
        assert!(!is_token_error("InternalServerError"));
    }

    #[test]
    fn delivery_response_parses_partial_bodies() {
        let parsed: DeliveryResponse =
            serde_json::from_str(r#"{"results":[{"error":"NotRegistered"}]}"#).unwrap();
        assert_eq!(parsed.results[0].error.as_deref(), Some("NotRegistered"));

        let empty: DeliveryResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.results.is_empty());
    }
}
