//! Refresh schedule -- enable/disable and interval control over one
//! subscription's periodic refresh job.
//!
//! Split into focused submodules:
//! - `core`: schedule struct, context, registry listener, accessors
//! - `control`: enable/interval/dispose operations and job start/stop
//! - `persistence`: save/restore through a [`ScheduleStore`](crate::ScheduleStore)
//! - `display`: human-readable schedule and last-refresh text

mod control;
mod core;
mod display;
mod persistence;

pub use self::core::{RefreshSchedule, ScheduleContext, ScheduleStatus};
pub use self::display::{DISABLED_TEXT, NEVER_TEXT, interval_as_string, refresh_event_as_string};
