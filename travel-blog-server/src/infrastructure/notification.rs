//! Delivery of post notifications: Redis pub/sub when configured, an
//! in-process broadcast channel otherwise.

use crate::application::notification::NotificationPublisher;
use crate::domain::EmailMessage;
use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes JSON-encoded messages on a Redis channel.
pub struct RedisNotificationPublisher {
    conn: ConnectionManager,
    channel: String,
}

impl RedisNotificationPublisher {
    pub async fn connect(url: &str, channel: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid REDIS_URL")?;

        let conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .context("Redis connection timed out")?
            .context("Failed to connect to Redis")?;

        tracing::info!("Post notifications go to Redis channel {}", channel);

        Ok(Self {
            conn,
            channel: channel.to_string(),
        })
    }
}

impl NotificationPublisher for RedisNotificationPublisher {
    fn publish(&self, message: EmailMessage) {
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode notification: {}", e);
                return;
            }
        };

        let mut conn = self.conn.clone();
        let channel = self.channel.clone();

        tokio::spawn(async move {
            match conn.publish::<_, _, ()>(&channel, payload).await {
                Ok(()) => tracing::debug!(channel = %channel, "Post notification published"),
                Err(e) => tracing::error!(channel = %channel, "Failed to publish post notification: {}", e),
            }
        });
    }
}

/// Single-process fallback: messages go to whoever subscribed.
pub struct BroadcastNotificationPublisher {
    sender: broadcast::Sender<EmailMessage>,
}

impl BroadcastNotificationPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EmailMessage> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotificationPublisher {
    fn default() -> Self {
        Self::new(100)
    }
}

impl NotificationPublisher for BroadcastNotificationPublisher {
    fn publish(&self, message: EmailMessage) {
        // Ignore send errors (no subscribers)
        if self.sender.send(message).is_err() {
            tracing::debug!("No subscribers for post notifications");
        }
    }
}

/// Logs every message that reaches `receiver` until the channel closes.
pub fn spawn_notification_logger(mut receiver: broadcast::Receiver<EmailMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    tracing::info!(
                        recipients = ?message.recipients_emails,
                        "Notification: {}",
                        message.subject
                    );
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!(lagged = count, "Notification logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
