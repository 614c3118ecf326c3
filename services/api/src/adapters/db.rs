//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the store ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use chief_of_staff_core::domain::{
    Commitment, CommitmentStatus, PushSubscription, SubscriptionKeys,
};
use chief_of_staff_core::ports::{
    ConfigStore, PortError, PortResult, SubscriptionStore, TaskStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ConfigStore`, `TaskStore` and
/// `SubscriptionStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CommitmentRecord {
    id: Uuid,
    description: String,
    deadline: Option<DateTime<Utc>>,
    status: String,
    assignee: Option<String>,
    task_type: Option<String>,
    created_date: DateTime<Utc>,
}

impl CommitmentRecord {
    fn to_domain(self) -> Commitment {
        Commitment {
            id: self.id,
            description: self.description,
            deadline: self.deadline,
            status: CommitmentStatus::from_str(&self.status),
            assignee: self.assignee,
            task_type: self.task_type,
            created_date: self.created_date,
        }
    }
}

#[derive(FromRow)]
struct SubscriptionRecord {
    user_id: Uuid,
    endpoint: String,
    keys: String,
}

impl SubscriptionRecord {
    fn to_domain(self) -> PortResult<PushSubscription> {
        let keys: SubscriptionKeys = serde_json::from_str(&self.keys).map_err(|e| {
            PortError::Unexpected(format!(
                "Corrupt keys for subscription {}: {}",
                self.endpoint, e
            ))
        })?;
        Ok(PushSubscription {
            user_id: self.user_id,
            endpoint: self.endpoint,
            keys,
        })
    }
}

const COMMITMENT_COLUMNS: &str =
    "id, description, deadline, status, assignee, task_type, created_date";

/// Bounds of the given local calendar day expressed in UTC.
fn local_day_bounds(date: NaiveDate) -> PortResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| PortError::Unexpected(format!("No local midnight on {}", date)))?;
    let next = date
        .succ_opt()
        .ok_or_else(|| PortError::Unexpected(format!("No day after {}", date)))?
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| PortError::Unexpected(format!("No local midnight after {}", date)))?;
    Ok((start.with_timezone(&Utc), next.with_timezone(&Utc)))
}

//=========================================================================================
// `ConfigStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConfigStore for DbAdapter {
    async fn get_value(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn set_value(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO config (key, value, updated_date) VALUES ($1, $2, NOW())
             ON CONFLICT (key) DO UPDATE SET value = $2, updated_date = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `TaskStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TaskStore for DbAdapter {
    async fn find_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Commitment>> {
        let records = sqlx::query_as::<_, CommitmentRecord>(&format!(
            "SELECT {} FROM commitments
             WHERE deadline >= $1 AND deadline <= $2 AND status != 'completed'
             ORDER BY deadline ASC",
            COMMITMENT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM commitments
             WHERE deadline < $1 AND status != 'completed'",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn count_pending(&self) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM commitments WHERE status != 'completed'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn find_tasks_due_on_date(&self, date: NaiveDate) -> PortResult<Vec<Commitment>> {
        let (start, end) = local_day_bounds(date)?;
        let records = sqlx::query_as::<_, CommitmentRecord>(&format!(
            "SELECT {} FROM commitments
             WHERE deadline >= $1 AND deadline < $2 AND status != 'completed'
             ORDER BY deadline ASC",
            COMMITMENT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// `SubscriptionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SubscriptionStore for DbAdapter {
    async fn list_subscriptions(&self) -> PortResult<Vec<PushSubscription>> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT user_id, endpoint, keys FROM push_subscriptions",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_subscription(&self, subscription: &PushSubscription) -> PortResult<()> {
        let keys = serde_json::to_string(&subscription.keys)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO push_subscriptions (endpoint, user_id, keys, created_date)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (endpoint) DO UPDATE SET user_id = $2, keys = $3",
        )
        .bind(&subscription.endpoint)
        .bind(subscription.user_id)
        .bind(keys)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn remove_subscription(&self, endpoint: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
