use serde::{Deserialize, Serialize};

/// What triggered a refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshType {
    /// Fired by a schedule's timer.
    Scheduled,
    /// Requested explicitly (e.g. a "refresh now" action).
    Manual,
}

/// Lifecycle state of a [`RefreshJob`](crate::RefreshJob).
///
/// `Idle → Scheduled → Running → {Done, Cancelling → Done}`. `Done` may be
/// re-armed back to `Scheduled` depending on the job's [`RearmPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Constructed, never scheduled.
    Idle,
    /// Waiting for its delay to elapse.
    Scheduled,
    /// Comparison in flight.
    Running,
    /// Cancel requested while running; the in-flight pass is allowed to finish.
    Cancelling,
    /// Terminated. Can be scheduled again.
    Done,
}

impl JobState {
    /// Scheduled or running: the job will produce (or is producing) a run.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Scheduled | JobState::Running)
    }
}

/// Re-arm decision inputs, evaluated when a job reaches `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RearmPolicy {
    /// Re-arm after a cancellation.
    pub restart_on_cancel: bool,
    /// Re-arm after a run completes (successfully or not).
    pub reschedule_after_run: bool,
}

impl RearmPolicy {
    /// Policy for a schedule's periodic job.
    pub const PERIODIC: RearmPolicy = RearmPolicy {
        restart_on_cancel: true,
        reschedule_after_run: true,
    };

    /// Never re-arm. Used for one-shot jobs and when stopping a job.
    pub const ONE_SHOT: RearmPolicy = RearmPolicy {
        restart_on_cancel: false,
        reschedule_after_run: false,
    };
}

/// Outcome of the comparison pass behind a [`RefreshEvent`](crate::RefreshEvent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshStatus {
    /// Still running.
    Pending,
    Ok,
    /// The comparison failed; the event carries no changes.
    Failed(String),
}
