//! What happens when a scheduled refresh completes while its schedule is
//! enabled.

use tracing::info;

use crate::event::RefreshEvent;
use crate::schedule::ScheduleStatus;

/// Reacts to completed scheduled refreshes.
///
/// Invoked only for `Scheduled` (never `Manual`) events, and only while the
/// owning schedule is still enabled when the event is delivered.
pub trait NotificationPolicy: Send + Sync {
    fn refresh_done(&self, schedule: &ScheduleStatus, event: &RefreshEvent);
}

/// Reports completed refreshes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationPolicy;

impl NotificationPolicy for LogNotificationPolicy {
    fn refresh_done(&self, schedule: &ScheduleStatus, event: &RefreshEvent) {
        if event.is_failed() {
            info!(
                target_name = %schedule.target,
                schedule = %schedule.schedule_text,
                "Scheduled refresh of '{}' failed",
                schedule.target
            );
        } else if event.changes().is_empty() {
            info!(
                target_name = %schedule.target,
                schedule = %schedule.schedule_text,
                "Scheduled refresh of '{}' found no changes",
                schedule.target
            );
        } else {
            info!(
                target_name = %schedule.target,
                schedule = %schedule.schedule_text,
                changes = event.changes().len(),
                "Scheduled refresh of '{}' found {} change(s)",
                schedule.target,
                event.changes().len()
            );
        }
    }
}
