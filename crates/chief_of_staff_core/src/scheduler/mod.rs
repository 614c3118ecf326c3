//! crates/chief_of_staff_core/src/scheduler/mod.rs
//!
//! The notification scheduling core: time-window arithmetic, notification
//! settings, push fan-out, and the background loop that ties them together.

pub mod dispatch;
pub mod settings;
pub mod task;
pub mod windows;

pub use dispatch::{daily_digest_payload, overdue_payload, task_reminder_payload, Notifier};
pub use settings::NotificationSettings;
pub use task::{spawn_scheduler, Scheduler, SchedulerConfig, CHECK_INTERVAL, STARTUP_DELAY};
pub use windows::{parse_clock, DIGEST_WINDOW_MINUTES};
