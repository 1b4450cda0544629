//! Incoming-webhook notification client (Slack/Mattermost style)

use std::sync::Arc;

use async_trait::async_trait;

use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};
use crate::WhatsupError;

/// Posts `{"text", "icon_url"}` JSON payloads to a webhook URL
pub struct WebhookNotifier {
    kind: String,
    webhook: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WebhookNotifier {
    // The webhook URL usually embeds a secret token
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("kind", &self.kind)
            .finish()
    }
}

impl WebhookNotifier {
    pub fn new(kind: &str, webhook: &str, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!("Created WebhookNotifier of type '{}'", kind);

        Self {
            kind: kind.to_string(),
            webhook: webhook.to_string(),
            http,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let payload = serde_json::json!({
            "text": notification.text,
            "icon_url": notification.icon_url,
        });

        tracing::debug!(
            "Sending {} notification: text='{}'",
            self.kind,
            notification.text
        );

        let response = self
            .http
            .post_json(&self.webhook, &payload)
            .await
            .map_err(|e| WhatsupError::Notification(e.to_string()))?;

        if !response.is_success() {
            return Err(WhatsupError::Notification(format!(
                "{} webhook returned status {}: {}",
                self.kind, response.status, response.body
            )));
        }

        tracing::debug!("{} notification sent successfully", self.kind);
        Ok(())
    }
}
