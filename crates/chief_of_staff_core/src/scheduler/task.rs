//! crates/chief_of_staff_core/src/scheduler/task.rs
//!
//! The background scheduler task: one cooperative loop that runs the
//! task-reminder, overdue, and daily-digest checks on a fixed interval,
//! plus once shortly after startup. Because all three checks are awaited
//! in sequence on a single task, two ticks can never run concurrently
//! against the digest date marker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::Commitment;
use crate::ports::{ConfigStore, PortResult, TaskStore};
use crate::scheduler::dispatch::Notifier;
use crate::scheduler::settings::NotificationSettings;
use crate::scheduler::windows::{
    minutes_of_day, parse_clock, reminder_window_end, within_digest_window,
};

/// Check for due reminders every 15 minutes for responsive notifications.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Delay before the first check, so dependent services finish starting.
pub const STARTUP_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub check_interval: Duration,
    pub startup_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: CHECK_INTERVAL,
            startup_delay: STARTUP_DELAY,
        }
    }
}

/// Process-local scheduler state. The digest marker is reset on restart,
/// so a restart near digest time can produce a duplicate digest.
#[derive(Debug, Default)]
struct SchedulerState {
    last_digest_date: Option<NaiveDate>,
}

/// The notification scheduler. Owns its run state; collaborators are
/// reached only through ports.
pub struct Scheduler {
    config_store: Arc<dyn ConfigStore>,
    tasks: Arc<dyn TaskStore>,
    notifier: Notifier,
    config: SchedulerConfig,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        tasks: Arc<dyn TaskStore>,
        notifier: Notifier,
    ) -> Self {
        Self::with_config(config_store, tasks, notifier, SchedulerConfig::default())
    }

    pub fn with_config(
        config_store: Arc<dyn ConfigStore>,
        tasks: Arc<dyn TaskStore>,
        notifier: Notifier,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            config_store,
            tasks,
            notifier,
            config,
            state: SchedulerState::default(),
        }
    }

    /// Runs the scheduler for the life of the process: one delayed initial
    /// tick, then one tick per interval. Never returns.
    pub async fn run(mut self) {
        info!(
            "Task scheduler started (checking every {} minutes)",
            self.config.check_interval.as_secs() / 60
        );

        tokio::time::sleep(self.config.startup_delay).await;
        self.tick(Local::now()).await;

        // interval_at so the first interval tick lands one full period
        // after the initial run rather than immediately.
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.check_interval,
            self.config.check_interval,
        );
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.tick(Local::now()).await;
        }
    }

    /// Runs the three checks for one tick. Each check isolates its own
    /// failure so the others still run.
    pub async fn tick(&mut self, now: DateTime<Local>) {
        let settings = NotificationSettings::load(self.config_store.as_ref()).await;

        if let Err(e) = self.check_task_reminders(&settings, now).await {
            error!("Error checking task reminders: {}", e);
        }
        if let Err(e) = self.check_overdue_tasks(&settings, now).await {
            error!("Error checking overdue tasks: {}", e);
        }
        if let Err(e) = self.send_daily_digest(&settings, now).await {
            error!("Error sending daily digest: {}", e);
        }
    }

    /// Sends a reminder for every not-completed task whose deadline falls
    /// within the configured horizon.
    async fn check_task_reminders(
        &self,
        settings: &NotificationSettings,
        now: DateTime<Local>,
    ) -> PortResult<()> {
        if settings.is_quiet_hours(now.time()) {
            debug!("In quiet hours, skipping task reminders");
            return Ok(());
        }
        if !settings.task_reminders_enabled {
            debug!("Task reminders disabled, skipping");
            return Ok(());
        }

        let now_utc = now.with_timezone(&Utc);
        let window_end = reminder_window_end(now_utc, settings.reminder_timing_hours);
        let tasks = self.tasks.find_tasks_due_between(now_utc, window_end).await?;

        if tasks.is_empty() {
            debug!("No upcoming task reminders");
            return Ok(());
        }

        info!(
            "Found {} tasks due within {} hours",
            tasks.len(),
            settings.reminder_timing_hours
        );

        for task in &tasks {
            match self.notifier.send_task_reminder(task).await {
                Ok(_) => info!("Sent reminder for task {}: {}", task.id, preview(task)),
                Err(e) => error!("Failed to send reminder for task {}: {}", task.id, e),
            }
        }
        Ok(())
    }

    /// Sends one aggregate notification when any tasks are overdue.
    async fn check_overdue_tasks(
        &self,
        settings: &NotificationSettings,
        now: DateTime<Local>,
    ) -> PortResult<()> {
        if settings.is_quiet_hours(now.time()) {
            debug!("In quiet hours, skipping overdue check");
            return Ok(());
        }
        if !settings.overdue_alerts_enabled {
            debug!("Overdue alerts disabled, skipping");
            return Ok(());
        }

        let count = self.tasks.count_overdue(now.with_timezone(&Utc)).await?;
        if count > 0 {
            info!("Found {} overdue tasks", count);
            self.notifier.send_overdue_notification(count).await?;
        }
        Ok(())
    }

    /// Sends the daily digest when the current time is inside the digest
    /// window and none has been sent for today's date.
    ///
    /// The date marker is only recorded after at least one successful
    /// delivery, so a fully failed batch is retried on the next tick
    /// inside the window.
    async fn send_daily_digest(
        &mut self,
        settings: &NotificationSettings,
        now: DateTime<Local>,
    ) -> PortResult<()> {
        if !settings.daily_digest_enabled {
            return Ok(());
        }

        let Some(digest_minute) = parse_clock(&settings.daily_digest_time) else {
            error!(
                "Invalid daily digest time '{}', skipping digest",
                settings.daily_digest_time
            );
            return Ok(());
        };
        if !within_digest_window(minutes_of_day(now.time()), digest_minute) {
            return Ok(());
        }

        let today = now.date_naive();
        if self.state.last_digest_date == Some(today) {
            return Ok(());
        }

        let due_today = self.tasks.find_tasks_due_on_date(today).await?;
        let overdue = self.tasks.count_overdue(now.with_timezone(&Utc)).await?;
        let pending = self.tasks.count_pending().await?;

        let outcome = self
            .notifier
            .send_daily_digest(due_today.len(), overdue, pending)
            .await?;

        if outcome.sent > 0 {
            self.state.last_digest_date = Some(today);
            info!(
                "Daily digest sent ({} due today, {} overdue, {} pending)",
                due_today.len(),
                overdue,
                pending
            );
        }
        Ok(())
    }
}

fn preview(task: &Commitment) -> String {
    task.description.chars().take(50).collect()
}

/// Spawns the scheduler onto the runtime. There is no shutdown hook; the
/// task runs for the life of the process.
pub fn spawn_scheduler(scheduler: Scheduler) -> JoinHandle<()> {
    tokio::spawn(scheduler.run())
}
