//! crates/chief_of_staff_core/src/scheduler/dispatch.rs
//!
//! Fan-out of notification payloads to every registered push subscription,
//! plus the builders for the three payload shapes the scheduler sends.
//! Deliveries settle independently: one failure never aborts the batch, and
//! a subscription the push service reports as gone is pruned on the spot.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    Commitment, DispatchOutcome, NotificationAction, NotificationData, NotificationPayload,
};
use crate::ports::{DeliveryError, PortResult, PushDelivery, SubscriptionStore};

const NOTIFICATION_ICON: &str = "/icon-192.png";
const REMINDER_BODY_LIMIT: usize = 100;
const DIGEST_BODY_LIMIT: usize = 110;

/// Sends payloads to all registered subscriptions through a
/// [`PushDelivery`] implementation.
pub struct Notifier {
    subscriptions: Arc<dyn SubscriptionStore>,
    delivery: Arc<dyn PushDelivery>,
}

impl Notifier {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, delivery: Arc<dyn PushDelivery>) -> Self {
        Self {
            subscriptions,
            delivery,
        }
    }

    /// Delivers `payload` to every subscription concurrently and returns
    /// aggregate counts.
    ///
    /// Individual delivery failures only increment the failure counter; a
    /// `Gone` failure additionally removes the subscription. The only error
    /// that propagates is a failure to enumerate the subscriptions at all.
    pub async fn send_to_all(&self, payload: &NotificationPayload) -> PortResult<DispatchOutcome> {
        let subscriptions = self.subscriptions.list_subscriptions().await?;

        if subscriptions.is_empty() {
            info!("No push subscriptions found");
            return Ok(DispatchOutcome::default());
        }

        info!(
            "Sending push notification to {} devices",
            subscriptions.len()
        );

        let attempts = subscriptions.iter().map(|subscription| async move {
            match self.delivery.deliver(subscription, payload).await {
                Ok(()) => true,
                Err(DeliveryError::Gone(status)) => {
                    warn!(
                        "Subscription {} is gone (status {}), removing",
                        subscription.endpoint, status
                    );
                    if let Err(e) = self
                        .subscriptions
                        .remove_subscription(&subscription.endpoint)
                        .await
                    {
                        warn!(
                            "Failed to remove dead subscription {}: {}",
                            subscription.endpoint, e
                        );
                    }
                    false
                }
                Err(e) => {
                    warn!("Failed to send to {}: {}", subscription.endpoint, e);
                    false
                }
            }
        });

        let results = futures::future::join_all(attempts).await;
        let sent = results.iter().filter(|delivered| **delivered).count();
        let outcome = DispatchOutcome {
            sent,
            failed: results.len() - sent,
        };

        info!(
            "Push notifications sent: {} succeeded, {} failed",
            outcome.sent, outcome.failed
        );
        Ok(outcome)
    }

    pub async fn send_task_reminder(&self, task: &Commitment) -> PortResult<DispatchOutcome> {
        self.send_to_all(&task_reminder_payload(task)).await
    }

    pub async fn send_overdue_notification(&self, count: u64) -> PortResult<DispatchOutcome> {
        self.send_to_all(&overdue_payload(count)).await
    }

    pub async fn send_daily_digest(
        &self,
        due_today: usize,
        overdue: u64,
        pending: u64,
    ) -> PortResult<DispatchOutcome> {
        self.send_to_all(&daily_digest_payload(due_today, overdue, pending))
            .await
    }
}

/// Reminder for a single task: labelled title, truncated description,
/// view/complete actions routing back to the task.
pub fn task_reminder_payload(task: &Commitment) -> NotificationPayload {
    NotificationPayload {
        title: format!(
            "📋 Task Reminder: {}",
            task.task_type.as_deref().unwrap_or("Task")
        ),
        body: truncate_chars(&task.description, REMINDER_BODY_LIMIT),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        tag: format!("task-{}", task.id),
        data: NotificationData {
            url: "/#commitments".to_string(),
            task_id: Some(task.id),
            deadline: task.deadline,
            notification_tag: None,
        },
        actions: vec![
            NotificationAction::new("view", "View Task"),
            NotificationAction::new("complete", "Mark Complete"),
        ],
    }
}

/// One aggregate notification for all overdue tasks.
pub fn overdue_payload(count: u64) -> NotificationPayload {
    NotificationPayload {
        title: "⚠️ Overdue Tasks".to_string(),
        body: format!(
            "You have {} overdue task{}",
            count,
            if count == 1 { "" } else { "s" }
        ),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        tag: "overdue-tasks".to_string(),
        data: NotificationData {
            url: "/#commitments".to_string(),
            task_id: None,
            deadline: None,
            notification_tag: None,
        },
        actions: vec![NotificationAction::new("view", "View Tasks")],
    }
}

/// The once-per-day digest. Body composed by priority: tasks due today,
/// then the overdue count, then the generic pending count, else a
/// "nothing due" message.
pub fn daily_digest_payload(due_today: usize, overdue: u64, pending: u64) -> NotificationPayload {
    let mut body = String::new();
    if due_today > 0 {
        body.push_str(&format!(
            "📅 {} task{} due today",
            due_today,
            if due_today == 1 { "" } else { "s" }
        ));
    }
    if overdue > 0 {
        if !body.is_empty() {
            body.push_str(" • ");
        }
        body.push_str(&format!("⚠️ {} overdue", overdue));
    }
    if body.is_empty() && pending > 0 {
        body = format!(
            "📋 {} pending task{}",
            pending,
            if pending == 1 { "" } else { "s" }
        );
    }
    if body.is_empty() {
        body = "✨ No tasks for today!".to_string();
    }

    NotificationPayload {
        title: "📰 Daily Digest".to_string(),
        body: truncate_chars(&body, DIGEST_BODY_LIMIT),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        tag: "daily-digest".to_string(),
        data: NotificationData {
            url: "/#tasks".to_string(),
            task_id: None,
            deadline: None,
            notification_tag: Some("daily-digest".to_string()),
        },
        actions: Vec::new(),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitmentStatus, PushSubscription, SubscriptionKeys};
    use crate::ports::PortError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            user_id: Uuid::new_v4(),
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: "p256dh-key".to_string(),
                auth: "auth-key".to_string(),
            },
        }
    }

    fn task(description: &str) -> Commitment {
        Commitment {
            id: Uuid::new_v4(),
            description: description.to_string(),
            deadline: Some(Utc::now()),
            status: CommitmentStatus::Pending,
            assignee: None,
            task_type: None,
            created_date: Utc::now(),
        }
    }

    struct MemorySubscriptions {
        subscriptions: Mutex<Vec<PushSubscription>>,
    }

    impl MemorySubscriptions {
        fn new(subscriptions: Vec<PushSubscription>) -> Arc<Self> {
            Arc::new(Self {
                subscriptions: Mutex::new(subscriptions),
            })
        }

        fn endpoints(&self) -> Vec<String> {
            self.subscriptions
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.endpoint.clone())
                .collect()
        }
    }

    #[async_trait]
    impl SubscriptionStore for MemorySubscriptions {
        async fn list_subscriptions(&self) -> PortResult<Vec<PushSubscription>> {
            Ok(self.subscriptions.lock().unwrap().clone())
        }

        async fn save_subscription(&self, subscription: &PushSubscription) -> PortResult<()> {
            self.subscriptions.lock().unwrap().push(subscription.clone());
            Ok(())
        }

        async fn remove_subscription(&self, endpoint: &str) -> PortResult<()> {
            self.subscriptions
                .lock()
                .unwrap()
                .retain(|s| s.endpoint != endpoint);
            Ok(())
        }
    }

    struct FailingSubscriptions;

    #[async_trait]
    impl SubscriptionStore for FailingSubscriptions {
        async fn list_subscriptions(&self) -> PortResult<Vec<PushSubscription>> {
            Err(PortError::Unexpected("database down".to_string()))
        }

        async fn save_subscription(&self, _subscription: &PushSubscription) -> PortResult<()> {
            Err(PortError::Unexpected("database down".to_string()))
        }

        async fn remove_subscription(&self, _endpoint: &str) -> PortResult<()> {
            Err(PortError::Unexpected("database down".to_string()))
        }
    }

    /// Delivery stub that fails for configured endpoints and records every
    /// successful delivery.
    struct ScriptedDelivery {
        failures: HashMap<String, u16>,
        delivered: Mutex<Vec<(String, NotificationPayload)>>,
    }

    impl ScriptedDelivery {
        fn new(failures: &[(&str, u16)]) -> Arc<Self> {
            Arc::new(Self {
                failures: failures
                    .iter()
                    .map(|(endpoint, status)| (endpoint.to_string(), *status))
                    .collect(),
                delivered: Mutex::new(Vec::new()),
            })
        }

        fn delivered_endpoints(&self) -> Vec<String> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .map(|(endpoint, _)| endpoint.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PushDelivery for ScriptedDelivery {
        async fn deliver(
            &self,
            subscription: &PushSubscription,
            payload: &NotificationPayload,
        ) -> Result<(), DeliveryError> {
            match self.failures.get(&subscription.endpoint) {
                Some(status) if *status == 404 || *status == 410 => {
                    Err(DeliveryError::Gone(*status))
                }
                Some(status) => Err(DeliveryError::Failed(format!("status {}", status))),
                None => {
                    self.delivered
                        .lock()
                        .unwrap()
                        .push((subscription.endpoint.clone(), payload.clone()));
                    Ok(())
                }
            }
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let store = MemorySubscriptions::new(vec![
            subscription("https://push/a"),
            subscription("https://push/b"),
            subscription("https://push/c"),
        ]);
        let delivery = ScriptedDelivery::new(&[("https://push/b", 500)]);
        let notifier = Notifier::new(store.clone(), delivery.clone());

        let outcome = notifier
            .send_to_all(&overdue_payload(1))
            .await
            .expect("batch must settle");

        assert_eq!(outcome, DispatchOutcome { sent: 2, failed: 1 });
        assert_eq!(
            delivery.delivered_endpoints(),
            vec!["https://push/a".to_string(), "https://push/c".to_string()]
        );
        // A plain failure must not prune the subscription.
        assert_eq!(store.endpoints().len(), 3);
    }

    #[tokio::test]
    async fn gone_subscription_is_pruned_and_not_retried() {
        let store = MemorySubscriptions::new(vec![
            subscription("https://push/alive"),
            subscription("https://push/dead"),
        ]);
        let delivery = ScriptedDelivery::new(&[("https://push/dead", 410)]);
        let notifier = Notifier::new(store.clone(), delivery.clone());

        let outcome = notifier.send_to_all(&overdue_payload(2)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome { sent: 1, failed: 1 });
        assert_eq!(store.endpoints(), vec!["https://push/alive".to_string()]);

        // The next batch only sees the surviving subscription.
        let outcome = notifier.send_to_all(&overdue_payload(2)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome { sent: 1, failed: 0 });
    }

    #[tokio::test]
    async fn status_404_also_prunes() {
        let store = MemorySubscriptions::new(vec![subscription("https://push/gone")]);
        let delivery = ScriptedDelivery::new(&[("https://push/gone", 404)]);
        let notifier = Notifier::new(store.clone(), delivery);

        let outcome = notifier.send_to_all(&overdue_payload(1)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome { sent: 0, failed: 1 });
        assert!(store.endpoints().is_empty());
    }

    #[tokio::test]
    async fn empty_subscription_list_is_a_successful_noop() {
        let store = MemorySubscriptions::new(Vec::new());
        let delivery = ScriptedDelivery::new(&[]);
        let notifier = Notifier::new(store, delivery);

        let outcome = notifier.send_to_all(&overdue_payload(1)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::default());
    }

    #[tokio::test]
    async fn unlistable_subscriptions_propagate() {
        let notifier = Notifier::new(Arc::new(FailingSubscriptions), ScriptedDelivery::new(&[]));
        assert!(notifier.send_to_all(&overdue_payload(1)).await.is_err());
    }

    #[test]
    fn overdue_body_is_plural_aware() {
        assert_eq!(overdue_payload(1).body, "You have 1 overdue task");
        assert_eq!(overdue_payload(3).body, "You have 3 overdue tasks");
    }

    #[test]
    fn reminder_payload_truncates_and_routes_to_task() {
        let mut long_task = task(&"x".repeat(250));
        long_task.task_type = Some("Follow-up".to_string());

        let payload = task_reminder_payload(&long_task);
        assert_eq!(payload.title, "📋 Task Reminder: Follow-up");
        assert_eq!(payload.body.chars().count(), 100);
        assert_eq!(payload.tag, format!("task-{}", long_task.id));
        assert_eq!(payload.data.task_id, Some(long_task.id));
        assert_eq!(payload.actions.len(), 2);

        let untyped = task_reminder_payload(&task("ship the report"));
        assert_eq!(untyped.title, "📋 Task Reminder: Task");
        assert_eq!(untyped.body, "ship the report");
    }

    #[test]
    fn digest_body_composes_by_priority() {
        assert_eq!(
            daily_digest_payload(2, 1, 10).body,
            "📅 2 tasks due today • ⚠️ 1 overdue"
        );
        assert_eq!(daily_digest_payload(1, 0, 5).body, "📅 1 task due today");
        assert_eq!(daily_digest_payload(0, 4, 9).body, "⚠️ 4 overdue");
        assert_eq!(daily_digest_payload(0, 0, 3).body, "📋 3 pending tasks");
        assert_eq!(daily_digest_payload(0, 0, 0).body, "✨ No tasks for today!");
    }

    #[test]
    fn digest_body_is_capped_at_110_chars() {
        let payload = daily_digest_payload(1_000_000_000, 1_000_000_000, 0);
        assert!(payload.body.chars().count() <= 110);
    }

    #[test]
    fn payload_json_matches_service_worker_contract() {
        let payload = task_reminder_payload(&task("review budget"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["icon"], "/icon-192.png");
        assert_eq!(json["data"]["url"], "/#commitments");
        assert!(json["data"].get("taskId").is_some());
        assert!(json["data"].get("task_id").is_none());
        assert_eq!(json["actions"][1]["action"], "complete");
    }
}
