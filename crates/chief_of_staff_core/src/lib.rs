pub mod domain;
pub mod ports;
pub mod scheduler;

pub use domain::{
    Commitment, CommitmentStatus, DispatchOutcome, NotificationAction, NotificationData,
    NotificationPayload, PushSubscription, SubscriptionKeys,
};
pub use ports::{
    ConfigStore, DeliveryError, PortError, PortResult, PushDelivery, SubscriptionStore, TaskStore,
};
pub use scheduler::{
    spawn_scheduler, NotificationSettings, Notifier, Scheduler, SchedulerConfig,
};
