//! Notifier trait definition and shared delivery types.

use async_trait::async_trait;
use gate_primitives::UserId;
use tokio::sync::Mutex;
use tracing::info;

/// Errors that can occur during notification delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// The platform refused or failed the send.
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery {
        /// Platform-qualified recipient address.
        recipient: String,
        /// Platform-reported reason.
        reason: String,
    },

    /// The send did not finish within the per-recipient timeout.
    #[error("delivery to {recipient} timed out after {timeout_ms}ms")]
    Timeout {
        /// Recipient identifier.
        recipient: String,
        /// Timeout that elapsed.
        timeout_ms: u64,
    },
}

/// Composed text plus the ordered recipients it should reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipients, attempted independently.
    pub recipients: Vec<UserId>,
    /// Rendered message body.
    pub text: String,
}

/// Platform address of a private chat, `<platform>:<user_id>`.
#[must_use]
pub fn private_address(platform: &str, recipient: &UserId) -> String {
    format!("{platform}:{recipient}")
}

/// Delivery channel for rendered notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to a single recipient.
    async fn send(&self, recipient: &UserId, text: &str) -> Result<(), NotifyError>;

    /// Human-readable name for this channel.
    fn channel_name(&self) -> &str;
}

/// Notifier that writes each message to the tracing log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    platform: String,
}

impl LogNotifier {
    /// Creates a log notifier addressing recipients on `platform`.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &UserId, text: &str) -> Result<(), NotifyError> {
        let address = private_address(&self.platform, recipient);
        info!(recipient = %address, text, "notification");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

/// Delivered message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Platform-qualified address.
    pub address: String,
    /// Message body.
    pub text: String,
}

/// In-memory notifier that records deliveries and can simulate failures.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    platform: String,
    failing: Vec<UserId>,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    /// Creates a recorder addressing recipients on `platform`.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            failing: Vec::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes every send to `recipient` fail.
    #[must_use]
    pub fn failing_for(mut self, recipient: UserId) -> Self {
        self.failing.push(recipient);
        self
    }

    /// Returns and clears the recorded messages.
    pub async fn drain(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &UserId, text: &str) -> Result<(), NotifyError> {
        let address = private_address(&self.platform, recipient);
        if self.failing.contains(recipient) {
            return Err(NotifyError::Delivery {
                recipient: address,
                reason: "recipient unreachable".into(),
            });
        }

        self.sent.lock().await.push(SentMessage {
            address,
            text: text.to_owned(),
        });
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}
