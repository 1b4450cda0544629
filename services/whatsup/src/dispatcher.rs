//! Fan-out of status change notifications to the configured channels

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::NotificationChannel;
use crate::io::HttpClient;
use crate::notifier::{Notification, NotificationRecord, Notifier};
use crate::prober::StatusObservation;
use crate::webhook::WebhookNotifier;

/// A channel with a webhook, paired with the notifier that delivers to it
#[derive(Debug)]
struct ActiveChannel {
    channel: NotificationChannel,
    notifier: Arc<dyn Notifier>,
}

/// Sends one notification per active channel for a changed endpoint
#[derive(Debug, Default)]
pub struct Dispatcher {
    channels: Vec<ActiveChannel>,
}

impl Dispatcher {
    /// Build webhook notifiers for every channel that has a webhook.
    /// Channels without one are skipped.
    pub fn new(channels: &[NotificationChannel], http: Arc<dyn HttpClient>) -> Self {
        let channels = channels
            .iter()
            .filter_map(|channel| match channel.webhook() {
                Some(webhook) => {
                    let notifier: Arc<dyn Notifier> =
                        Arc::new(WebhookNotifier::new(&channel.kind, webhook, Arc::clone(&http)));
                    Some((channel.clone(), notifier))
                }
                None => {
                    tracing::debug!("Skipping '{}' channel without webhook", channel.kind);
                    None
                }
            })
            .collect();
        Self::with_notifiers(channels)
    }

    /// Use the given notifiers as-is, one per channel
    pub fn with_notifiers(channels: Vec<(NotificationChannel, Arc<dyn Notifier>)>) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|(channel, notifier)| ActiveChannel { channel, notifier })
                .collect(),
        }
    }

    /// Number of channels that will receive notifications
    pub fn active_channels(&self) -> usize {
        self.channels.len()
    }

    /// Notify every active channel about the new status of `endpoint`.
    ///
    /// A failing channel is logged and recorded; the remaining channels are
    /// still notified.
    pub async fn dispatch(
        &self,
        endpoint: &str,
        observation: &StatusObservation,
    ) -> Vec<NotificationRecord> {
        let now_ms = current_epoch_ms();
        let mut records = Vec::with_capacity(self.channels.len());

        for ActiveChannel { channel, notifier } in &self.channels {
            let message = channel.message_for(observation);
            let notification = Notification {
                text: format!("{} - {}", message, endpoint),
                icon_url: channel.icon_url.clone(),
            };

            tracing::debug!(
                "Dispatching to '{}' for '{}': {}",
                notifier.kind(),
                endpoint,
                notification.text
            );

            let result = notifier.notify(&notification).await;
            if let Err(e) = &result {
                tracing::warn!(
                    "Notification via '{}' for '{}' failed: {}",
                    notifier.kind(),
                    endpoint,
                    e
                );
            }

            records.push(NotificationRecord {
                endpoint: endpoint.to_string(),
                channel: notifier.kind().to_string(),
                message: notification.text,
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
                timestamp_epoch_ms: now_ms,
            });
        }

        records
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
