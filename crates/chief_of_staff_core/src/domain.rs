//! crates/chief_of_staff_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except for the push notification payload, whose JSON shape is part of
//! the contract with the browser service worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion state of a commitment. The scheduler only distinguishes
/// `Completed` from everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentStatus {
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl CommitmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CommitmentStatus::Pending => "pending",
            CommitmentStatus::InProgress => "in_progress",
            CommitmentStatus::Completed => "completed",
            CommitmentStatus::Other(s) => s,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => CommitmentStatus::Pending,
            "in_progress" => CommitmentStatus::InProgress,
            "completed" => CommitmentStatus::Completed,
            other => CommitmentStatus::Other(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CommitmentStatus::Completed)
    }
}

/// A tracked action item extracted from a transcript or added by hand.
/// The scheduler only ever reads commitments; creation, completion and
/// deletion happen in the task-management routes.
#[derive(Debug, Clone)]
pub struct Commitment {
    pub id: Uuid,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub status: CommitmentStatus,
    pub assignee: Option<String>,
    pub task_type: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// Encryption material for one browser push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser-registered web-push endpoint. `endpoint` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSubscription {
    pub user_id: Uuid,
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Routing data the service worker uses when a notification is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_tag: Option<String>,
}

/// A button rendered on the notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

/// The JSON payload handed to the push service, matching what the
/// service worker's `push` handler expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data: NotificationData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

/// Aggregate result of a fan-out to all subscriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}
