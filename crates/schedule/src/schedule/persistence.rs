use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::store::{KEY_ENABLED, KEY_INTERVAL, ScheduleStore};
use crate::subscriber::RefreshTarget;

use super::core::{RefreshSchedule, ScheduleContext, lock};

impl RefreshSchedule {
    /// Write the enabled flag and interval into `store`.
    pub fn save_state(&self, store: &mut dyn ScheduleStore) {
        let (enabled, interval_secs) = {
            let state = lock(&self.state);
            (state.enabled, state.interval_secs)
        };
        store.put_string(KEY_ENABLED, if enabled { "true" } else { "false" });
        store.put_integer(KEY_INTERVAL, i64::try_from(interval_secs).unwrap_or(i64::MAX));
        debug!(target_name = %self.target_name, enabled, interval_secs, "refresh schedule saved");
    }

    /// Create a schedule for `target`, restoring the enabled flag and
    /// interval from `store` when given.
    ///
    /// Never starts a job: the caller decides when background work may
    /// begin. Missing or malformed fields fall back to `ctx.defaults`.
    pub fn init(
        store: Option<&dyn ScheduleStore>,
        target: &Arc<dyn RefreshTarget>,
        ctx: ScheduleContext,
    ) -> Self {
        let defaults = ctx.defaults;
        let schedule = Self::new(target, ctx);
        let Some(store) = store else {
            return schedule;
        };

        let interval_secs = match store.get_integer(KEY_INTERVAL) {
            Some(n) if n > 0 => n as u64,
            Some(n) => {
                let err = ScheduleError::Configuration(format!(
                    "{} must be positive, got {}",
                    KEY_INTERVAL, n
                ));
                warn!(
                    target_name = %schedule.target_name,
                    error = %err,
                    "using default refresh interval"
                );
                defaults.interval_secs
            }
            None => {
                let err = ScheduleError::Configuration(format!(
                    "{} missing or not an integer",
                    KEY_INTERVAL
                ));
                warn!(
                    target_name = %schedule.target_name,
                    error = %err,
                    "using default refresh interval"
                );
                defaults.interval_secs
            }
        };

        let enabled = match store.get_string(KEY_ENABLED).as_deref() {
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                let err = ScheduleError::Configuration(format!(
                    "{} has unexpected value '{}'",
                    KEY_ENABLED, other
                ));
                warn!(
                    target_name = %schedule.target_name,
                    error = %err,
                    "using default enabled flag"
                );
                defaults.enabled
            }
            None => defaults.enabled,
        };

        {
            // Nothing is running yet, so both fields can be set directly
            // without touching the job.
            let mut state = lock(&schedule.state);
            state.interval_secs = interval_secs;
            state.enabled = enabled;
        }
        debug!(
            target_name = %schedule.target_name,
            enabled,
            interval_secs,
            "refresh schedule restored"
        );
        schedule
    }
}
