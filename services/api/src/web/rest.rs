//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chief_of_staff_core::domain::{PushSubscription, SubscriptionKeys};
use chief_of_staff_core::scheduler::settings::{
    KEY_DAILY_DIGEST, KEY_DAILY_DIGEST_TIME, KEY_OVERDUE_ALERTS, KEY_QUIET_HOURS_ENABLED,
    KEY_QUIET_HOURS_END, KEY_QUIET_HOURS_START, KEY_REMINDER_TIMING, KEY_TASK_REMINDERS,
};
use chief_of_staff_core::scheduler::{parse_clock, NotificationSettings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        subscribe_handler,
        unsubscribe_handler,
        public_key_handler,
        get_notification_settings_handler,
        update_notification_settings_handler,
    ),
    components(
        schemas(
            SubscribeRequest,
            SubscriptionKeysPayload,
            UnsubscribeRequest,
            PublicKeyResponse,
            NotificationSettingsPayload,
            NotificationSettingsUpdate,
        )
    ),
    tags(
        (name = "AI Chief of Staff API", description = "Push subscription and notification settings endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Encryption keys as sent by `PushSubscription.toJSON()` in the browser.
#[derive(Deserialize, ToSchema)]
pub struct SubscriptionKeysPayload {
    p256dh: String,
    auth: String,
}

/// A browser push subscription to register.
#[derive(Deserialize, ToSchema)]
pub struct SubscribeRequest {
    endpoint: String,
    keys: SubscriptionKeysPayload,
    /// Omitted for the single-user deployment.
    user_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct UnsubscribeRequest {
    endpoint: String,
}

/// The VAPID public key the browser needs to subscribe, if configured.
#[derive(Serialize, ToSchema)]
pub struct PublicKeyResponse {
    public_key: Option<String>,
}

/// The current notification settings, defaults applied.
#[derive(Serialize, ToSchema)]
pub struct NotificationSettingsPayload {
    task_reminders_enabled: bool,
    overdue_alerts_enabled: bool,
    daily_digest_enabled: bool,
    reminder_timing_hours: u32,
    quiet_hours_enabled: bool,
    quiet_hours_start: String,
    quiet_hours_end: String,
    daily_digest_time: String,
}

impl From<NotificationSettings> for NotificationSettingsPayload {
    fn from(settings: NotificationSettings) -> Self {
        Self {
            task_reminders_enabled: settings.task_reminders_enabled,
            overdue_alerts_enabled: settings.overdue_alerts_enabled,
            daily_digest_enabled: settings.daily_digest_enabled,
            reminder_timing_hours: settings.reminder_timing_hours,
            quiet_hours_enabled: settings.quiet_hours_enabled,
            quiet_hours_start: settings.quiet_hours_start,
            quiet_hours_end: settings.quiet_hours_end,
            daily_digest_time: settings.daily_digest_time,
        }
    }
}

/// A partial update; only the provided fields are written.
#[derive(Deserialize, ToSchema)]
pub struct NotificationSettingsUpdate {
    task_reminders_enabled: Option<bool>,
    overdue_alerts_enabled: Option<bool>,
    daily_digest_enabled: Option<bool>,
    reminder_timing_hours: Option<u32>,
    quiet_hours_enabled: Option<bool>,
    quiet_hours_start: Option<String>,
    quiet_hours_end: Option<String>,
    daily_digest_time: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register a browser push subscription.
#[utoipa::path(
    post,
    path = "/push/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription saved"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn subscribe_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let subscription = PushSubscription {
        user_id: request.user_id.unwrap_or_else(Uuid::nil),
        endpoint: request.endpoint,
        keys: SubscriptionKeys {
            p256dh: request.keys.p256dh,
            auth: request.keys.auth,
        },
    };

    app_state
        .subscriptions
        .save_subscription(&subscription)
        .await
        .map_err(|e| {
            error!("Failed to save push subscription: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save push subscription".to_string(),
            )
        })?;

    info!("Push subscription saved for user: {}", subscription.user_id);
    Ok(StatusCode::CREATED)
}

/// Remove a push subscription by endpoint.
#[utoipa::path(
    post,
    path = "/push/unsubscribe",
    request_body = UnsubscribeRequest,
    responses(
        (status = 204, description = "Subscription removed"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn unsubscribe_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .subscriptions
        .remove_subscription(&request.endpoint)
        .await
        .map_err(|e| {
            error!("Failed to remove push subscription: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to remove push subscription".to_string(),
            )
        })?;

    info!("Push subscription removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch the VAPID public key the browser uses to subscribe.
#[utoipa::path(
    get,
    path = "/push/public-key",
    responses(
        (status = 200, description = "The configured public key, if any", body = PublicKeyResponse)
    )
)]
pub async fn public_key_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(PublicKeyResponse {
        public_key: app_state
            .config
            .vapid
            .as_ref()
            .map(|v| v.public_key.clone()),
    })
}

/// Fetch the current notification settings.
#[utoipa::path(
    get,
    path = "/settings/notifications",
    responses(
        (status = 200, description = "Current settings with defaults applied", body = NotificationSettingsPayload)
    )
)]
pub async fn get_notification_settings_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let settings = NotificationSettings::load(app_state.settings.as_ref()).await;
    Json(NotificationSettingsPayload::from(settings))
}

/// Update notification settings; only the provided fields change.
#[utoipa::path(
    put,
    path = "/settings/notifications",
    request_body = NotificationSettingsUpdate,
    responses(
        (status = 200, description = "Settings updated", body = NotificationSettingsPayload),
        (status = 400, description = "Invalid setting value"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_notification_settings_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<NotificationSettingsUpdate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut writes: Vec<(&str, String)> = Vec::new();

    if let Some(enabled) = update.task_reminders_enabled {
        writes.push((KEY_TASK_REMINDERS, enabled.to_string()));
    }
    if let Some(enabled) = update.overdue_alerts_enabled {
        writes.push((KEY_OVERDUE_ALERTS, enabled.to_string()));
    }
    if let Some(enabled) = update.daily_digest_enabled {
        writes.push((KEY_DAILY_DIGEST, enabled.to_string()));
    }
    if let Some(enabled) = update.quiet_hours_enabled {
        writes.push((KEY_QUIET_HOURS_ENABLED, enabled.to_string()));
    }
    if let Some(hours) = update.reminder_timing_hours {
        if hours == 0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "reminder_timing_hours must be a positive integer".to_string(),
            ));
        }
        writes.push((KEY_REMINDER_TIMING, hours.to_string()));
    }
    for (key, value) in [
        (KEY_QUIET_HOURS_START, &update.quiet_hours_start),
        (KEY_QUIET_HOURS_END, &update.quiet_hours_end),
        (KEY_DAILY_DIGEST_TIME, &update.daily_digest_time),
    ] {
        if let Some(value) = value {
            if parse_clock(value).is_none() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("'{}' is not a valid HH:MM time", value),
                ));
            }
            writes.push((key, value.clone()));
        }
    }

    for (key, value) in &writes {
        app_state.settings.set_value(key, value).await.map_err(|e| {
            error!("Failed to write setting {}: {:?}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update settings".to_string(),
            )
        })?;
    }

    info!("Updated {} notification setting(s)", writes.len());
    let settings = NotificationSettings::load(app_state.settings.as_ref()).await;
    Ok(Json(NotificationSettingsPayload::from(settings)))
}
