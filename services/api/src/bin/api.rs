//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, push::DisabledPushAdapter, push::WebPushAdapter},
    config::Config,
    error::ApiError,
    web::{
        get_notification_settings_handler, public_key_handler, rest::ApiDoc, state::AppState,
        subscribe_handler, unsubscribe_handler, update_notification_settings_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use chief_of_staff_core::ports::PushDelivery;
use chief_of_staff_core::scheduler::{spawn_scheduler, Notifier, Scheduler};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Push Delivery ---
    let push_delivery: Arc<dyn PushDelivery> = match config.vapid.clone() {
        Some(vapid) => {
            info!("Push notifications configured");
            Arc::new(
                WebPushAdapter::new(vapid)
                    .map_err(|e| ApiError::Internal(format!("Web push setup failed: {}", e)))?,
            )
        }
        None => {
            warn!("VAPID keys not configured - push notifications disabled");
            warn!("Generate keys with: npx web-push generate-vapid-keys");
            Arc::new(DisabledPushAdapter)
        }
    };

    // --- 4. Start the Notification Scheduler ---
    let notifier = Notifier::new(db_adapter.clone(), push_delivery);
    let scheduler = Scheduler::new(db_adapter.clone(), db_adapter.clone(), notifier);
    spawn_scheduler(scheduler);

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        settings: db_adapter.clone(),
        subscriptions: db_adapter,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let api_router = Router::new()
        .route("/push/subscribe", post(subscribe_handler))
        .route("/push/unsubscribe", post(unsubscribe_handler))
        .route("/push/public-key", get(public_key_handler))
        .route(
            "/settings/notifications",
            get(get_notification_settings_handler).put(update_notification_settings_handler),
        )
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
