//! Best-effort fan-out of a notification to its recipients.
//!
//! Every recipient is attempted concurrently and independently, each bounded
//! by its own timeout. One recipient failing or stalling never prevents
//! attempts to the others.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use gate_primitives::UserId;

use crate::notifier::{Notification, Notifier, NotifyError};

/// Default per-recipient delivery timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of delivering to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Recipient identifier.
    pub recipient: UserId,
    /// Failure, if the delivery did not succeed.
    pub error: Option<NotifyError>,
    /// Time spent on this recipient.
    pub duration_ms: u64,
}

impl DeliveryResult {
    /// Returns true when the delivery succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-recipient outcomes, in recipient order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    results: Vec<DeliveryResult>,
}

impl DispatchReport {
    /// Returns per-recipient results.
    #[must_use]
    pub fn results(&self) -> &[DeliveryResult] {
        &self.results
    }

    /// Number of successful deliveries.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Returns true when at least one delivery succeeded.
    #[must_use]
    pub fn any_delivered(&self) -> bool {
        self.results.iter().any(DeliveryResult::is_success)
    }
}

/// Routes notifications through a single notifier channel.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channel", &self.notifier.channel_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default per-recipient timeout.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-recipient timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-recipient timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends the notification to every recipient.
    ///
    /// Failures are logged and recorded in the report; they are never
    /// returned as errors.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        if notification.recipients.is_empty() {
            tracing::debug!("no notification recipients");
            return DispatchReport::default();
        }

        let attempts = notification
            .recipients
            .iter()
            .map(|recipient| self.deliver(recipient, &notification.text));
        let results = join_all(attempts).await;

        let report = DispatchReport { results };
        if !report.any_delivered() {
            tracing::warn!(
                recipients = report.results.len(),
                channel = self.notifier.channel_name(),
                "notification reached no recipient"
            );
        }
        report
    }

    async fn deliver(&self, recipient: &UserId, text: &str) -> DeliveryResult {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.notifier.send(recipient, text)).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(_) => Some(NotifyError::Timeout {
                recipient: recipient.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match &error {
            None => tracing::info!(
                recipient = %recipient,
                channel = self.notifier.channel_name(),
                duration_ms,
                "notification delivered"
            ),
            Some(err) => tracing::warn!(
                recipient = %recipient,
                channel = self.notifier.channel_name(),
                error = %err,
                duration_ms,
                "notification delivery failed"
            ),
        }

        DeliveryResult {
            recipient: recipient.clone(),
            error,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::notifier::RecordingNotifier;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn notification(recipients: &[&str]) -> Notification {
        Notification {
            recipients: recipients.iter().map(|id| user(id)).collect(),
            text: "hello".into(),
        }
    }

    #[tokio::test]
    async fn delivers_to_all_recipients() {
        let notifier = Arc::new(RecordingNotifier::new("qq"));
        let dispatcher = Dispatcher::new(notifier.clone());

        let report = dispatcher.dispatch(&notification(&["a", "b"])).await;
        assert_eq!(report.delivered(), 2);
        assert!(report.any_delivered());
        assert_eq!(notifier.drain().await.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let notifier = Arc::new(RecordingNotifier::new("qq").failing_for(user("a")));
        let dispatcher = Dispatcher::new(notifier.clone());

        let report = dispatcher.dispatch(&notification(&["a", "b"])).await;
        assert_eq!(report.results().len(), 2);
        assert!(!report.results()[0].is_success());
        assert!(report.results()[1].is_success());
        assert!(report.any_delivered());

        let sent = notifier.drain().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].address, "qq:b");
    }

    #[tokio::test]
    async fn all_failed_is_reported_not_raised() {
        let notifier = Arc::new(
            RecordingNotifier::new("qq")
                .failing_for(user("a"))
                .failing_for(user("b")),
        );
        let report = Dispatcher::new(notifier)
            .dispatch(&notification(&["a", "b"]))
            .await;
        assert!(!report.any_delivered());
        assert_eq!(report.delivered(), 0);
    }

    #[tokio::test]
    async fn empty_recipient_list_is_a_no_op() {
        let dispatcher = Dispatcher::new(Arc::new(RecordingNotifier::new("qq")));
        let report = dispatcher.dispatch(&notification(&[])).await;
        assert!(report.results().is_empty());
        assert!(!report.any_delivered());
    }

    struct StallingNotifier {
        stall_for: UserId,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for StallingNotifier {
        async fn send(&self, recipient: &UserId, _text: &str) -> Result<(), NotifyError> {
            if recipient == &self.stall_for {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "stalling"
        }
    }

    #[tokio::test]
    async fn slow_recipient_times_out_without_blocking_others() {
        let notifier = Arc::new(StallingNotifier {
            stall_for: user("slow"),
            sent: AtomicUsize::new(0),
        });
        let dispatcher =
            Dispatcher::new(notifier.clone()).with_timeout(Duration::from_millis(50));

        let report = dispatcher.dispatch(&notification(&["slow", "fast"])).await;
        assert!(matches!(
            report.results()[0].error,
            Some(NotifyError::Timeout { timeout_ms: 50, .. })
        ));
        assert!(report.results()[1].is_success());
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }
}
