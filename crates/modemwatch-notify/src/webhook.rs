//! Webhook delivery (Discord-compatible).

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use modemwatch_engine::Notifier;

/// Timeout for a single delivery attempt.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook answered with status {0}")]
    Status(u16),
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: String,
}

/// Posts messages to an optional webhook endpoint.
///
/// Without an endpoint every notification is a no-op.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: Option<String>,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self { url, http })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Deliver `content` now. Success means the endpoint answered 204.
    pub async fn send(&self, content: &str) -> Result<(), NotifyError> {
        match &self.url {
            Some(url) => deliver(&self.http, url, content).await,
            None => Ok(()),
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify_after(&self, message: String, delay: Duration) {
        let Some(url) = self.url.clone() else {
            debug!("no webhook configured, notification dropped");
            return;
        };
        let http = self.http.clone();

        debug!(delay_secs = delay.as_secs(), "notification scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match deliver(&http, &url, &message).await {
                Ok(()) => info!("notification sent to webhook"),
                Err(e) => error!(error = %e, "failed to send notification to webhook"),
            }
        });
    }
}

async fn deliver(http: &reqwest::Client, url: &str, content: &str) -> Result<(), NotifyError> {
    let payload = WebhookPayload {
        content: content.to_string(),
    };
    let resp = http.post(url).json(&payload).send().await?;
    if resp.status() == StatusCode::NO_CONTENT {
        Ok(())
    } else {
        Err(NotifyError::Status(resp.status().as_u16()))
    }
}
