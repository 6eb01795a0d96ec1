//! Bounded background delivery of administrator notifications.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gate_notify::{DispatchReport, Dispatcher, Notification};
use gate_primitives::RequestId;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// Runs notification dispatches off the decision path.
///
/// At most `limit` dispatches deliver at once. Further submissions are
/// accepted immediately and queue for a permit, so [`DispatchPool::submit`]
/// never waits on delivery.
#[derive(Debug, Clone)]
pub struct DispatchPool {
    dispatcher: Dispatcher,
    permits: Arc<Semaphore>,
    limit: NonZeroUsize,
    outstanding: Arc<AtomicUsize>,
}

impl DispatchPool {
    /// Creates a pool delivering through `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, limit: NonZeroUsize) -> Self {
        Self {
            dispatcher,
            permits: Arc::new(Semaphore::new(limit.get())),
            limit,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Maximum number of dispatches delivering at once.
    #[must_use]
    pub fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    /// Dispatches accepted but not yet finished.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Returns `true` once [`DispatchPool::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Refuses further submissions. Accepted dispatches still deliver.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Queues `notification` for background delivery.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] after the pool has been closed.
    pub fn submit(
        &self,
        request_id: RequestId,
        notification: Notification,
    ) -> PoolResult<JoinHandle<DispatchReport>> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let dispatcher = self.dispatcher.clone();
        let permits = Arc::clone(&self.permits);
        let outstanding = OutstandingGuard::enter(Arc::clone(&self.outstanding));

        Ok(tokio::spawn(async move {
            // closing the semaphore wakes queued dispatches without a permit
            let permit = permits.acquire_owned().await.ok();
            let report = dispatcher.dispatch(&notification).await;
            drop(permit);
            drop(outstanding);
            debug!(
                %request_id,
                delivered = report.delivered(),
                recipients = report.results().len(),
                "admin notification finished"
            );
            report
        }))
    }
}

struct OutstandingGuard(Arc<AtomicUsize>);

impl OutstandingGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Errors produced by the dispatch pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Pool is closed and will not accept new dispatches.
    #[error("dispatch pool closed")]
    Closed,
}

/// Result alias for dispatch pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use gate_notify::{Notifier, NotifyError};
    use gate_primitives::UserId;

    use super::*;

    #[derive(Default)]
    struct SlowNotifier {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn send(&self, _recipient: &UserId, _text: &str) -> Result<(), NotifyError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "slow"
        }
    }

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn notification(admin: &str) -> Notification {
        Notification {
            recipients: vec![UserId::new(admin).unwrap()],
            text: "New join request".into(),
        }
    }

    #[tokio::test]
    async fn limit_bounds_concurrent_deliveries() {
        let notifier = Arc::new(SlowNotifier::default());
        let pool = DispatchPool::new(Dispatcher::new(notifier.clone()), limit(2));

        let handles: Vec<_> = ["a1", "a2", "a3", "a4"]
            .into_iter()
            .map(|admin| pool.submit(RequestId::random(), notification(admin)).unwrap())
            .collect();
        assert_eq!(pool.outstanding(), 4);

        for handle in handles {
            assert_eq!(handle.await.unwrap().delivered(), 1);
        }
        assert_eq!(notifier.peak.load(Ordering::SeqCst), 2);
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn closed_pool_refuses_submissions() {
        let notifier = Arc::new(SlowNotifier::default());
        let pool = DispatchPool::new(Dispatcher::new(notifier), limit(1));
        pool.close();

        let result = pool.submit(RequestId::random(), notification("a1"));
        assert_eq!(result.unwrap_err(), PoolError::Closed);
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn queued_dispatch_survives_close() {
        let notifier = Arc::new(SlowNotifier::default());
        let pool = DispatchPool::new(Dispatcher::new(notifier), limit(1));
        let first = pool.submit(RequestId::random(), notification("a1")).unwrap();
        let queued = pool.submit(RequestId::random(), notification("a2")).unwrap();

        pool.close();
        assert!(pool.is_closed());
        assert_eq!(queued.await.unwrap().delivered(), 1);
        assert_eq!(first.await.unwrap().delivered(), 1);
    }
}
