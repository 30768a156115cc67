use std::time::Duration;

use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::job::RefreshJob;
use crate::types::{JobState, RearmPolicy};

use super::core::{RefreshSchedule, ScheduleState, lock};

impl RefreshSchedule {
    /// Enable or disable periodic refresh.
    ///
    /// Enabling launches a job only when `allowed_to_start` is set, which
    /// lets restored configuration be marked enabled before background work
    /// is allowed. An already-enabled schedule without an active job is
    /// launched by a later call with `allowed_to_start`. Disabling always
    /// stops the job without restart.
    pub fn set_enabled(&self, enabled: bool, allowed_to_start: bool) {
        let mut state = lock(&self.state);
        if state.disposed {
            debug!(target_name = %self.target_name, "set_enabled ignored, schedule disposed");
            return;
        }
        let was_enabled = state.enabled;
        state.enabled = enabled;

        if enabled {
            let active = state.job.as_ref().is_some_and(|job| job.state().is_active());
            if allowed_to_start && !active {
                self.start_job(&mut state);
            }
        } else {
            self.stop_job(&mut state);
        }

        if was_enabled != enabled {
            let verb = if enabled { "enabled" } else { "disabled" };
            info!(target_name = %self.target_name, enabled, "refresh schedule {}", verb);
        }
    }

    /// Change the refresh interval.
    ///
    /// A changed interval always stops the current job and, if enabled,
    /// starts a new one with the new delay, so no job keeps running on a
    /// stale interval. Setting the current value does nothing.
    pub fn set_interval(&self, interval_secs: u64) -> Result<(), ScheduleError> {
        if interval_secs == 0 {
            return Err(ScheduleError::InvalidInterval(interval_secs));
        }
        let mut state = lock(&self.state);
        if state.disposed || state.interval_secs == interval_secs {
            return Ok(());
        }

        self.stop_job(&mut state);
        state.interval_secs = interval_secs;
        if state.enabled {
            self.start_job(&mut state);
        }
        info!(target_name = %self.target_name, interval_secs, "refresh interval changed");
        Ok(())
    }

    /// Stop any job and leave the listener registry for good. Idempotent.
    pub fn dispose(&self) {
        {
            let mut state = lock(&self.state);
            if state.disposed {
                return;
            }
            state.disposed = true;
            self.stop_job(&mut state);
        }
        self.registry.remove(self.listener_id);
        debug!(target_name = %self.target_name, "refresh schedule disposed");
    }

    /// Run one manual refresh now, independent of the periodic job.
    ///
    /// The resulting event is recorded as the last refresh but never reaches
    /// the notification policy. Returns `false` if the schedule is disposed
    /// or the target's roots can't be resolved.
    pub fn refresh_now(&self) -> bool {
        if lock(&self.state).disposed {
            return false;
        }
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        let Some(roots) = target.resolve_roots() else {
            debug!(target_name = %self.target_name, "manual refresh skipped, roots unavailable");
            return false;
        };
        let job = RefreshJob::one_shot(target.subscriber(), roots, self.job_context.clone());
        job.schedule(Duration::ZERO)
    }

    /// Arm the periodic job. No-op while the target's roots can't be resolved;
    /// a later control operation retries.
    fn start_job(&self, state: &mut ScheduleState) {
        let Some(target) = self.target.upgrade() else {
            debug!(target_name = %self.target_name, "target gone, not starting refresh job");
            return;
        };
        let Some(roots) = target.resolve_roots() else {
            debug!(target_name = %self.target_name, "roots unavailable, not starting refresh job");
            return;
        };

        let interval = Duration::from_secs(state.interval_secs);
        let job = match state.job.take() {
            Some(job)
                if matches!(job.state(), JobState::Idle | JobState::Done)
                    && job.interval() == interval =>
            {
                job
            }
            existing => {
                if let Some(job) = existing {
                    job.cancel_with(RearmPolicy::ONE_SHOT);
                }
                RefreshJob::periodic(target.subscriber(), roots, interval, self.job_context.clone())
            }
        };

        job.set_policy(RearmPolicy::PERIODIC);
        job.schedule(interval);
        state.job = Some(job);
    }

    /// Cancel the periodic job without restart and drop it. A running pass
    /// finishes but is not re-armed.
    fn stop_job(&self, state: &mut ScheduleState) {
        if let Some(job) = state.job.take() {
            job.cancel_with(RearmPolicy::ONE_SHOT);
            debug!(target_name = %self.target_name, "refresh job stopped");
        }
    }
}
