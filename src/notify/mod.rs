//! Notification delivery for completed analysis runs.
//!
//! Push delivery itself belongs to an external gateway; the pipeline hands
//! a [`NotificationEvent`] to a [`Notifier`]. The webhook implementation
//! POSTs the event JSON to whatever relay is configured; the log
//! implementation is the default for local runs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::NotificationEvent;

/// Errors surfaced by notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification connection error: {0}")]
    Connection(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Configuration for notification delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Relay endpoint to POST events to; log-only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Seam between the orchestrator and notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Notifier that only records the event in the log stream.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        info!(
            user = %event.user_email,
            title = %event.title,
            "notification: {}",
            event.body
        );
        Ok(())
    }
}

/// Notifier that POSTs the event JSON to a relay endpoint.
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::Connection(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| NotifyError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let event = NotificationEvent::list_update("a@b.c", "Kroger", "Added 2 items", "fam-1");
        assert!(LogNotifier.send(&event).await.is_ok());
    }
}
