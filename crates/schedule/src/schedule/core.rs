use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use resync_core::ScheduleConfig;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::ScheduleError;
use crate::event::RefreshEvent;
use crate::job::{JobContext, RefreshJob};
use crate::metrics::RefreshMetrics;
use crate::notification::{LogNotificationPolicy, NotificationPolicy};
use crate::registry::{ListenerError, ListenerId, ListenerRegistry, RefreshListener};
use crate::subscriber::{RefreshTarget, Subscriber};
use crate::types::{JobState, RefreshType};

use super::display;

/// Collaborators a schedule is wired to.
#[derive(Clone)]
pub struct ScheduleContext {
    pub registry: Arc<ListenerRegistry>,
    pub runtime: Handle,
    pub policy: Arc<dyn NotificationPolicy>,
    /// Starting values, and the fallback when restored state is unusable.
    pub defaults: ScheduleConfig,
}

impl ScheduleContext {
    /// Global registry, logging policy, default config, on the current runtime.
    pub fn current() -> Result<Self, ScheduleError> {
        let runtime = Handle::try_current().map_err(|e| ScheduleError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            registry: ListenerRegistry::global(),
            runtime,
            policy: Arc::new(LogNotificationPolicy),
            defaults: ScheduleConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<ListenerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn NotificationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_defaults(mut self, defaults: ScheduleConfig) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Snapshot of a schedule for display and notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleStatus {
    pub target: String,
    pub enabled: bool,
    pub interval_secs: u64,
    pub job_state: Option<JobState>,
    pub schedule_text: String,
    pub last_refresh_text: String,
}

/// Mutable schedule state. Every control operation and the registry
/// listener serialize on the mutex around this.
pub(super) struct ScheduleState {
    pub(super) enabled: bool,
    pub(super) interval_secs: u64,
    pub(super) job: Option<Arc<RefreshJob>>,
    pub(super) last_event: Option<RefreshEvent>,
    pub(super) disposed: bool,
}

impl ScheduleState {
    pub(super) fn status(&self, target: &str) -> ScheduleStatus {
        ScheduleStatus {
            target: target.to_string(),
            enabled: self.enabled,
            interval_secs: self.interval_secs,
            job_state: self.job.as_ref().map(|job| job.state()),
            schedule_text: display::schedule_text(self.enabled, self.interval_secs),
            last_refresh_text: display::refresh_event_as_string(self.last_event.as_ref()),
        }
    }
}

pub(super) fn lock(state: &Mutex<ScheduleState>) -> MutexGuard<'_, ScheduleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodic refresh schedule for one subscription target.
///
/// Holds at most one periodic [`RefreshJob`]. The target is referenced
/// weakly: the schedule lives inside the target's lifecycle, not the other
/// way round. Dropping the schedule disposes it.
pub struct RefreshSchedule {
    pub(super) target: Weak<dyn RefreshTarget>,
    pub(super) target_name: String,
    pub(super) state: Arc<Mutex<ScheduleState>>,
    pub(super) registry: Arc<ListenerRegistry>,
    pub(super) job_context: JobContext,
    pub(super) listener_id: ListenerId,
}

impl RefreshSchedule {
    /// Create a schedule for `target` and register its refresh listener.
    ///
    /// Starts from `ctx.defaults` but never launches a job; that takes a
    /// [`set_enabled`](Self::set_enabled) call with `allowed_to_start`.
    pub fn new(target: &Arc<dyn RefreshTarget>, ctx: ScheduleContext) -> Self {
        let interval_secs = if ctx.defaults.interval_secs == 0 {
            resync_core::config::DEFAULT_INTERVAL_SECS
        } else {
            ctx.defaults.interval_secs
        };
        let state = Arc::new(Mutex::new(ScheduleState {
            enabled: ctx.defaults.enabled,
            interval_secs,
            job: None,
            last_event: None,
            disposed: false,
        }));

        let listener = ScheduleListener {
            subscriber: target.subscriber(),
            target: target.name().to_string(),
            state: Arc::downgrade(&state),
            policy: ctx.policy,
        };
        let listener_id = ctx.registry.add(Arc::new(listener));
        debug!(target_name = %target.name(), "refresh schedule created");

        Self {
            target: Arc::downgrade(target),
            target_name: target.name().to_string(),
            state,
            job_context: JobContext {
                registry: Arc::clone(&ctx.registry),
                runtime: ctx.runtime,
                metrics: Arc::new(RwLock::new(RefreshMetrics::default())),
            },
            registry: ctx.registry,
            listener_id,
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// The target, if it is still alive.
    pub fn target(&self) -> Option<Arc<dyn RefreshTarget>> {
        self.target.upgrade()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    /// Refresh interval in seconds.
    pub fn interval_secs(&self) -> u64 {
        lock(&self.state).interval_secs
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.state).disposed
    }

    /// State of the periodic job, or `None` when the schedule holds none.
    pub fn job_state(&self) -> Option<JobState> {
        lock(&self.state).job.as_ref().map(|job| job.state())
    }

    /// Whether a periodic job is scheduled or running.
    pub fn has_active_job(&self) -> bool {
        self.job_state().is_some_and(JobState::is_active)
    }

    /// The most recently completed refresh of this target, scheduled or manual.
    pub fn last_refresh_event(&self) -> Option<RefreshEvent> {
        lock(&self.state).last_event.clone()
    }

    pub fn metrics(&self) -> RefreshMetrics {
        self.job_context
            .metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> ScheduleStatus {
        lock(&self.state).status(&self.target_name)
    }
}

impl Drop for RefreshSchedule {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// The schedule's entry in the listener registry.
///
/// Records completed events from this schedule's subscriber instance and forwards
/// scheduled ones to the notification policy while the schedule is enabled.
struct ScheduleListener {
    subscriber: Arc<dyn Subscriber>,
    target: String,
    state: Weak<Mutex<ScheduleState>>,
    policy: Arc<dyn NotificationPolicy>,
}

impl RefreshListener for ScheduleListener {
    fn refresh_done(&self, event: &RefreshEvent) -> Result<(), ListenerError> {
        if !event.is_from(&self.subscriber) {
            return Ok(());
        }
        let Some(state) = self.state.upgrade() else {
            return Ok(());
        };

        // The policy runs after the lock is released so it may call back
        // into the schedule.
        let status = {
            let mut guard = lock(&state);
            guard.last_event = Some(event.clone());
            if !guard.enabled || event.refresh_type() != RefreshType::Scheduled {
                return Ok(());
            }
            guard.status(&self.target)
        };
        self.policy.refresh_done(&status, event);
        Ok(())
    }
}
