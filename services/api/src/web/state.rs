//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chief_of_staff_core::ports::{ConfigStore, SubscriptionStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn ConfigStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub config: Arc<Config>,
}
