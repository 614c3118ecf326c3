//! crates/chief_of_staff_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or the
//! web-push protocol.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{Commitment, NotificationPayload, PushSubscription};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Why a single push delivery failed.
///
/// `Gone` means the push service reported the subscription as permanently
/// invalid (HTTP 404 or 410); the caller is expected to prune it.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscription is gone (status {0})")]
    Gone(u16),
    #[error("delivery failed: {0}")]
    Failed(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Key-value application settings backed by the `config` table.
///
/// Reads happen on every scheduler tick; writes only come from the
/// settings UI routes.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_value(&self, key: &str) -> PortResult<Option<String>>;

    async fn set_value(&self, key: &str, value: &str) -> PortResult<()>;
}

/// Read-only view of the commitments table, scoped to what the
/// scheduler needs.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Commitments with a deadline in `[start, end]` (inclusive) that are
    /// not completed, ordered by ascending deadline.
    async fn find_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Commitment>>;

    /// Count of commitments whose deadline is strictly before `now` and
    /// that are not completed.
    async fn count_overdue(&self, now: DateTime<Utc>) -> PortResult<u64>;

    /// Count of all commitments that are not completed.
    async fn count_pending(&self) -> PortResult<u64>;

    /// Commitments due on the given local calendar day that are not
    /// completed, ordered by ascending deadline.
    async fn find_tasks_due_on_date(&self, date: NaiveDate) -> PortResult<Vec<Commitment>>;
}

/// Storage for browser push subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list_subscriptions(&self) -> PortResult<Vec<PushSubscription>>;

    /// Insert or replace by endpoint.
    async fn save_subscription(&self, subscription: &PushSubscription) -> PortResult<()>;

    async fn remove_subscription(&self, endpoint: &str) -> PortResult<()>;
}

/// Delivery of one payload to one subscription, e.g. via the Web Push
/// protocol.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError>;
}
