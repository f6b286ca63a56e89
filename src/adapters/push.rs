//! Push gateway webhook notifications
//!
//! Posts award notifications to the platform's push gateway.

use super::ports::NotificationDispatcher;
use crate::domain::Notification;
use crate::error::{LaurelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

/// Webhook dispatcher for the push gateway
#[derive(Clone)]
pub struct PushDispatcher {
    client: Client,
    webhook_url: String,
}

#[derive(Serialize)]
struct PushMessage<'a> {
    recipient: &'a str,
    token: &'a str,
    category: &'a str,
    title: &'a str,
    body: &'a str,
}

impl PushDispatcher {
    /// Create a dispatcher with an explicit URL
    pub fn new(webhook_url: String, request_timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .build()?;
        info!("Push notifications enabled");
        Ok(Self { client, webhook_url })
    }
}

#[async_trait]
impl NotificationDispatcher for PushDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<()> {
        let message = PushMessage {
            recipient: &notification.recipient,
            token: &notification.token,
            category: notification.category.as_str(),
            title: &notification.title,
            body: &notification.body,
        };

        let resp = self.client.post(&self.webhook_url).json(&message).send().await?;

        if resp.status().is_success() {
            debug!("Push notification sent to {}", notification.recipient);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("Push notification failed: {} - {}", status, body);
            Err(LaurelError::Dispatch(format!("HTTP {}: {}", status, body)))
        }
    }
}

/// Dispatcher used when no push gateway is configured; logs each message
#[derive(Debug, Clone, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<()> {
        info!(
            "[no gateway] {} -> {}: {}",
            notification.category, notification.recipient, notification.title
        );
        Ok(())
    }
}
