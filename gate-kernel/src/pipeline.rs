//! Join-request pipeline: fetch policy, decide, notify.

use std::sync::Arc;

use gate_config::GateConfig;
use gate_notify::{
    Composer, DispatchReport, Dispatcher, Notification, NotificationContext, Notifier,
};
use gate_policy::{Decision, DecisionEngine, Evaluation, JoinRequest};
use gate_primitives::RequestId;
use gate_store::{PolicyStore, StoreResult};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch_pool::DispatchPool;

/// Outcome of one join request.
///
/// The decision is final when this value is returned; notification delivery
/// may still be in flight.
#[derive(Debug)]
pub struct Admission {
    request_id: RequestId,
    evaluation: Evaluation,
    dispatch: Option<JoinHandle<DispatchReport>>,
}

impl Admission {
    /// Identifier of the evaluated request.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Decision and evidence.
    #[must_use]
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Whether the requester should be let in.
    #[must_use]
    pub fn approved(&self) -> bool {
        self.evaluation.is_admitted()
    }

    /// Short explanation suitable for a reply.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self.evaluation.decision() {
            Decision::Whitelisted | Decision::Allowed => "verification passed",
            Decision::Blacklisted => "user is blacklisted",
            Decision::Rejected => "no rule matched",
        }
    }

    /// Whether a notification was handed to the dispatcher.
    #[must_use]
    pub fn notification_scheduled(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Waits for notification delivery to finish.
    ///
    /// Returns `None` when nothing was dispatched or the dispatch task died.
    pub async fn delivery(self) -> Option<DispatchReport> {
        match self.dispatch?.await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(request_id = %self.request_id, error = %err, "notification task failed");
                None
            }
        }
    }
}

/// Wires the policy store, decision engine, composer, and dispatch pool.
pub struct AdmissionService {
    store: Arc<dyn PolicyStore>,
    config: Arc<GateConfig>,
    engine: DecisionEngine,
    composer: Composer,
    dispatch: DispatchPool,
}

impl std::fmt::Debug for AdmissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionService")
            .field("engine", &self.engine)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl AdmissionService {
    /// Builds a service from configuration.
    #[must_use]
    pub fn new(
        store: Arc<dyn PolicyStore>,
        notifier: Arc<dyn Notifier>,
        config: GateConfig,
    ) -> Self {
        let engine = DecisionEngine::new(config.default_mode);
        let composer = Composer::new(config.admin_notification_messages.clone());
        let dispatcher = Dispatcher::new(notifier).with_timeout(config.notification_timeout());
        let dispatch = DispatchPool::new(dispatcher, config.notification_concurrency);
        Self {
            store,
            config: Arc::new(config),
            engine,
            composer,
            dispatch,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Returns the policy store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Returns the pool delivering administrator notifications.
    #[must_use]
    pub fn dispatch_pool(&self) -> &DispatchPool {
        &self.dispatch
    }

    /// Decides a join request and schedules the administrator notification.
    ///
    /// Policy is read fresh for every call. Delivery runs in the background
    /// and never changes the returned decision.
    ///
    /// # Errors
    ///
    /// Propagates store read failures; no decision is made in that case.
    pub async fn handle(&self, request: &JoinRequest) -> StoreResult<Admission> {
        let snapshot = self.store.snapshot(request.group_id()).await?;
        let evaluation = self.engine.evaluate(request, &snapshot);

        if self.config.enable_logging {
            info!(
                request_id = %request.id(),
                group_id = %request.group_id(),
                user_id = %request.requester_id(),
                reason = request.reason(),
                decision = %evaluation.decision(),
                matched = evaluation.evidence().len(),
                "join request evaluated"
            );
        }

        let dispatch = self
            .notification_for(request, &evaluation)
            .and_then(|notification| self.schedule(request.id(), notification));

        Ok(Admission {
            request_id: request.id(),
            evaluation,
            dispatch,
        })
    }

    /// Composes the administrator notification, if one should be sent.
    #[must_use]
    pub fn notification_for(
        &self,
        request: &JoinRequest,
        evaluation: &Evaluation,
    ) -> Option<Notification> {
        if !self.config.enable_admin_notification {
            debug!(request_id = %request.id(), "admin notification disabled");
            return None;
        }
        if self.config.admin_list.is_empty() {
            info!(
                request_id = %request.id(),
                "no administrators configured, skipping notification"
            );
            return None;
        }

        let context = NotificationContext::from(request);
        Some(Notification {
            recipients: self.config.admin_list.clone(),
            text: self.composer.compose(evaluation, &context),
        })
    }

    fn schedule(
        &self,
        request_id: RequestId,
        notification: Notification,
    ) -> Option<JoinHandle<DispatchReport>> {
        match self.dispatch.submit(request_id, notification) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(%request_id, error = %err, "admin notification not scheduled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gate_notify::RecordingNotifier;
    use gate_policy::{DefaultPolicy, Rule};
    use gate_primitives::{GroupId, UserId};
    use gate_store::{ListKind, MemoryStore};

    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn group() -> GroupId {
        GroupId::new("g1").unwrap()
    }

    fn config(admins: &[&str]) -> GateConfig {
        GateConfig {
            admin_list: admins.iter().map(|id| user(id)).collect(),
            ..GateConfig::default()
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let rule = Rule::parse("student", user("admin"), Utc::now()).unwrap();
        store.save_rules(&group(), &[rule]).await.unwrap();
        store
            .add_member(&group(), ListKind::Blacklist, &user("u1"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn decides_and_notifies_admins() {
        let notifier = Arc::new(RecordingNotifier::new("qq"));
        let service =
            AdmissionService::new(seeded_store().await, notifier.clone(), config(&["a1", "a2"]));

        let request = JoinRequest::new(group(), user("u2"), "I am a student");
        let admission = service.handle(&request).await.unwrap();
        assert!(admission.approved());
        assert_eq!(admission.evaluation().decision(), Decision::Allowed);
        assert_eq!(admission.summary(), "verification passed");

        let report = admission.delivery().await.unwrap();
        assert_eq!(report.delivered(), 2);

        let sent = notifier.drain().await;
        assert_eq!(sent[0].address, "qq:a1");
        assert!(sent[0].text.contains("Matched rules:\n1. keyword: student"));
    }

    #[tokio::test]
    async fn blacklisted_requester_is_rejected() {
        let notifier = Arc::new(RecordingNotifier::new("qq"));
        let service = AdmissionService::new(seeded_store().await, notifier, config(&["a1"]));

        let request = JoinRequest::new(group(), user("u1"), "I am a student");
        let admission = service.handle(&request).await.unwrap();
        assert!(!admission.approved());
        assert_eq!(admission.summary(), "user is blacklisted");
    }

    #[tokio::test]
    async fn empty_admin_list_skips_notification() {
        let notifier = Arc::new(RecordingNotifier::new("qq"));
        let service = AdmissionService::new(seeded_store().await, notifier.clone(), config(&[]));

        let request = JoinRequest::new(group(), user("u2"), "I am a teacher");
        let admission = service.handle(&request).await.unwrap();
        assert_eq!(admission.summary(), "no rule matched");
        assert!(!admission.notification_scheduled());
        assert!(admission.delivery().await.is_none());
        assert!(notifier.drain().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_notification_is_not_composed() {
        let service = AdmissionService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier::new("qq")),
            GateConfig {
                enable_admin_notification: false,
                ..config(&["a1"])
            },
        );
        let request = JoinRequest::new(group(), user("u2"), "hi");
        assert!(service.notification_for(&request, &Evaluation::whitelisted()).is_none());
    }

    #[tokio::test]
    async fn failed_delivery_keeps_decision() {
        let notifier = Arc::new(RecordingNotifier::new("qq").failing_for(user("a1")));
        let config = GateConfig {
            default_mode: DefaultPolicy::Reject,
            ..config(&["a1"])
        };
        let service = AdmissionService::new(Arc::new(MemoryStore::new()), notifier, config);

        let request = JoinRequest::new(group(), user("u9"), "hello");
        let admission = service.handle(&request).await.unwrap();
        assert_eq!(admission.evaluation().decision(), Decision::Rejected);

        let report = admission.delivery().await.unwrap();
        assert!(!report.any_delivered());
    }

    #[test]
    fn dispatch_limit_comes_from_config() {
        let service = AdmissionService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier::new("qq")),
            GateConfig::from_json_str(r#"{"notification_concurrency": 3}"#).unwrap(),
        );
        assert_eq!(service.dispatch_pool().limit().get(), 3);
    }

    #[tokio::test]
    async fn closed_dispatch_pool_still_returns_decision() {
        let service = AdmissionService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier::new("qq")),
            config(&["a1"]),
        );
        service.dispatch_pool().close();

        let request = JoinRequest::new(group(), user("u2"), "hello");
        let admission = service.handle(&request).await.unwrap();
        assert!(admission.approved());
        assert!(!admission.notification_scheduled());
    }
}
