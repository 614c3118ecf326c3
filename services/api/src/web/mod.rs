pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary
// that builds the web server router.
pub use rest::{
    get_notification_settings_handler, public_key_handler, subscribe_handler,
    unsubscribe_handler, update_notification_settings_handler,
};
