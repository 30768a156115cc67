//! Periodic refresh scheduling for synchronization subscriptions.
//!
//! A [`RefreshSchedule`] keeps one subscription fresh by owning at most one
//! [`RefreshJob`] that periodically asks a [`Subscriber`] for its change set.
//! Completed runs are broadcast as [`RefreshEvent`]s through a
//! [`ListenerRegistry`], which the schedule itself listens on to record the
//! last event and feed its [`NotificationPolicy`].

pub mod error;
pub mod event;
pub mod job;
pub mod metrics;
pub mod notification;
pub mod registry;
pub mod schedule;
pub mod snapshot;
pub mod store;
pub mod subscriber;
#[cfg(test)]
mod testing;
pub mod types;

pub use error::ScheduleError;
pub use event::RefreshEvent;
pub use job::{JobContext, RefreshJob};
pub use metrics::RefreshMetrics;
pub use notification::{LogNotificationPolicy, NotificationPolicy};
pub use registry::{ListenerError, ListenerId, ListenerRegistry, RefreshListener};
pub use schedule::{RefreshSchedule, ScheduleContext, ScheduleStatus, refresh_event_as_string};
pub use snapshot::{DirectoryTarget, SnapshotSubscriber};
pub use store::{MemoryStore, ScheduleStore, StoreValue};
pub use subscriber::{RefreshTarget, Subscriber};
pub use types::{JobState, RearmPolicy, RefreshStatus, RefreshType};
