//! crates/chief_of_staff_core/src/scheduler/settings.rs
//!
//! Notification settings as stored in the key-value `config` table.
//! Every key has a safe default, and a failed read of any key falls back to
//! that default (logged, never propagated) so a flaky store can never stop
//! the scheduler.

use chrono::NaiveTime;
use tracing::warn;

use crate::ports::ConfigStore;
use crate::scheduler::windows::{minutes_of_day, parse_clock, window_contains};

pub const KEY_TASK_REMINDERS: &str = "notification_task_reminders";
pub const KEY_OVERDUE_ALERTS: &str = "notification_overdue_alerts";
pub const KEY_DAILY_DIGEST: &str = "notification_daily_digest";
pub const KEY_REMINDER_TIMING: &str = "notification_reminder_timing";
pub const KEY_QUIET_HOURS_ENABLED: &str = "notification_quiet_hours_enabled";
pub const KEY_QUIET_HOURS_START: &str = "notification_quiet_hours_start";
pub const KEY_QUIET_HOURS_END: &str = "notification_quiet_hours_end";
pub const KEY_DAILY_DIGEST_TIME: &str = "notification_daily_digest_time";

const DEFAULT_REMINDER_HOURS: u32 = 24;
const DEFAULT_QUIET_START: &str = "22:00";
const DEFAULT_QUIET_END: &str = "08:00";
const DEFAULT_DIGEST_TIME: &str = "08:00";

/// A snapshot of the notification settings, read once per scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub task_reminders_enabled: bool,
    pub overdue_alerts_enabled: bool,
    pub daily_digest_enabled: bool,
    pub reminder_timing_hours: u32,
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: String,
    pub quiet_hours_end: String,
    pub daily_digest_time: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            task_reminders_enabled: true,
            overdue_alerts_enabled: true,
            daily_digest_enabled: false,
            reminder_timing_hours: DEFAULT_REMINDER_HOURS,
            quiet_hours_enabled: false,
            quiet_hours_start: DEFAULT_QUIET_START.to_string(),
            quiet_hours_end: DEFAULT_QUIET_END.to_string(),
            daily_digest_time: DEFAULT_DIGEST_TIME.to_string(),
        }
    }
}

impl NotificationSettings {
    /// Loads all notification keys from the store, applying per-key
    /// defaults when a key is absent or unreadable.
    ///
    /// Reminders and overdue alerts are opt-out (`"false"` disables);
    /// the daily digest and quiet hours are opt-in (`"true"` enables).
    pub async fn load(store: &dyn ConfigStore) -> Self {
        let defaults = Self::default();

        let reminder_timing_hours = match read_key(store, KEY_REMINDER_TIMING).await {
            Some(value) => match value.parse::<u32>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    warn!(
                        "Invalid value '{}' for {}, using {} hours",
                        value, KEY_REMINDER_TIMING, DEFAULT_REMINDER_HOURS
                    );
                    DEFAULT_REMINDER_HOURS
                }
            },
            None => DEFAULT_REMINDER_HOURS,
        };

        Self {
            task_reminders_enabled: read_key(store, KEY_TASK_REMINDERS)
                .await
                .map_or(true, |v| v != "false"),
            overdue_alerts_enabled: read_key(store, KEY_OVERDUE_ALERTS)
                .await
                .map_or(true, |v| v != "false"),
            daily_digest_enabled: read_key(store, KEY_DAILY_DIGEST)
                .await
                .map_or(false, |v| v == "true"),
            reminder_timing_hours,
            quiet_hours_enabled: read_key(store, KEY_QUIET_HOURS_ENABLED)
                .await
                .map_or(false, |v| v == "true"),
            quiet_hours_start: read_key(store, KEY_QUIET_HOURS_START)
                .await
                .unwrap_or(defaults.quiet_hours_start),
            quiet_hours_end: read_key(store, KEY_QUIET_HOURS_END)
                .await
                .unwrap_or(defaults.quiet_hours_end),
            daily_digest_time: read_key(store, KEY_DAILY_DIGEST_TIME)
                .await
                .unwrap_or(defaults.daily_digest_time),
        }
    }

    /// Whether the given wall-clock time falls inside the configured quiet
    /// hours. Always false when quiet hours are disabled. Unparseable
    /// start/end values fall back to the 22:00-08:00 defaults.
    pub fn is_quiet_hours(&self, time: NaiveTime) -> bool {
        if !self.quiet_hours_enabled {
            return false;
        }
        let start = parse_clock(&self.quiet_hours_start).unwrap_or_else(|| {
            warn!(
                "Invalid quiet hours start '{}', using {}",
                self.quiet_hours_start, DEFAULT_QUIET_START
            );
            parse_clock(DEFAULT_QUIET_START).unwrap_or(0)
        });
        let end = parse_clock(&self.quiet_hours_end).unwrap_or_else(|| {
            warn!(
                "Invalid quiet hours end '{}', using {}",
                self.quiet_hours_end, DEFAULT_QUIET_END
            );
            parse_clock(DEFAULT_QUIET_END).unwrap_or(0)
        });
        window_contains(minutes_of_day(time), start, end)
    }
}

async fn read_key(store: &dyn ConfigStore, key: &str) -> Option<String> {
    match store.get_value(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read config key {}: {}. Using default.", key, e);
            None
        }
    }
}
