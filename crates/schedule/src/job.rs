//! Cancellable, self-re-arming refresh job.
//!
//! A job is armed by spawning a timer task on the runtime that sleeps for the
//! requested delay and then runs one comparison pass. Every transition of the
//! job's state machine happens under its own mutex, and each arming bumps a
//! generation counter so a timer that lost a race with `cancel` finds a stale
//! generation and exits without running.
//!
//! Cancellation is cooperative: a running comparison is never interrupted.
//! Cancelling only decides (through the job's [`RearmPolicy`], read at the
//! moment the job reaches `Done`) whether another run is armed afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use resync_core::{ComparisonError, Root};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::event::RefreshEvent;
use crate::metrics::RefreshMetrics;
use crate::registry::ListenerRegistry;
use crate::subscriber::Subscriber;
use crate::types::{JobState, RearmPolicy, RefreshType};

/// Collaborators a job needs to run.
#[derive(Clone)]
pub struct JobContext {
    /// Where refresh start/done notifications go.
    pub registry: Arc<ListenerRegistry>,
    /// Runtime the timer and comparison tasks are spawned on.
    pub runtime: Handle,
    /// Run statistics, shared with the owning schedule.
    pub metrics: Arc<RwLock<RefreshMetrics>>,
}

struct JobInner {
    state: JobState,
    policy: RearmPolicy,
    generation: u64,
    timer: Option<AbortHandle>,
}

/// One unit of background comparison work.
pub struct RefreshJob {
    name: String,
    subscriber: Arc<dyn Subscriber>,
    roots: Arc<[Root]>,
    interval: Duration,
    refresh_type: RefreshType,
    ctx: JobContext,
    inner: Mutex<JobInner>,
}

impl RefreshJob {
    /// A periodic job that re-arms itself every `interval`.
    pub fn periodic(
        subscriber: Arc<dyn Subscriber>,
        roots: Vec<Root>,
        interval: Duration,
        ctx: JobContext,
    ) -> Arc<Self> {
        Self::build(
            subscriber,
            roots,
            interval,
            RefreshType::Scheduled,
            RearmPolicy::PERIODIC,
            ctx,
        )
    }

    /// A manual job that runs once and never re-arms.
    pub fn one_shot(
        subscriber: Arc<dyn Subscriber>,
        roots: Vec<Root>,
        ctx: JobContext,
    ) -> Arc<Self> {
        Self::build(
            subscriber,
            roots,
            Duration::ZERO,
            RefreshType::Manual,
            RearmPolicy::ONE_SHOT,
            ctx,
        )
    }

    fn build(
        subscriber: Arc<dyn Subscriber>,
        roots: Vec<Root>,
        interval: Duration,
        refresh_type: RefreshType,
        policy: RearmPolicy,
        ctx: JobContext,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: subscriber.name().to_string(),
            subscriber,
            roots: roots.into(),
            interval,
            refresh_type,
            ctx,
            inner: Mutex::new(JobInner {
                state: JobState::Idle,
                policy,
                generation: 0,
                timer: None,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn refresh_type(&self) -> RefreshType {
        self.refresh_type
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    pub fn policy(&self) -> RearmPolicy {
        self.lock().policy
    }

    /// Replace the re-arm policy. Takes effect at the next `Done` transition.
    pub fn set_policy(&self, policy: RearmPolicy) {
        self.lock().policy = policy;
    }

    /// Arm the job to run after `delay`.
    ///
    /// Only valid from `Idle` or `Done`; returns `false` and does nothing if
    /// the job is already scheduled, running or cancelling.
    pub fn schedule(self: &Arc<Self>, delay: Duration) -> bool {
        let mut inner = self.lock();
        match inner.state {
            JobState::Idle | JobState::Done => {
                self.arm(&mut inner, delay);
                true
            }
            state => {
                debug!(job = %self.name, ?state, "schedule ignored, job already active");
                false
            }
        }
    }

    /// Request cancellation using the current re-arm policy.
    pub fn cancel(self: &Arc<Self>) {
        let mut inner = self.lock();
        self.cancel_locked(&mut inner);
    }

    /// Replace the re-arm policy and cancel in one step, so the policy the
    /// caller sets is the one the `Done` transition sees.
    pub fn cancel_with(self: &Arc<Self>, policy: RearmPolicy) {
        let mut inner = self.lock();
        inner.policy = policy;
        self.cancel_locked(&mut inner);
    }

    fn cancel_locked(self: &Arc<Self>, inner: &mut JobInner) {
        match inner.state {
            JobState::Scheduled => {
                if let Some(timer) = inner.timer.take() {
                    timer.abort();
                }
                inner.state = JobState::Done;
                debug!(job = %self.name, "scheduled job cancelled");
                if inner.policy.restart_on_cancel {
                    self.arm(inner, self.interval);
                    debug!(
                        job = %self.name,
                        interval = ?self.interval,
                        "job restarted after cancel"
                    );
                }
            }
            JobState::Running => {
                inner.state = JobState::Cancelling;
                debug!(job = %self.name, "running job cancelling, in-flight pass will finish");
            }
            JobState::Idle | JobState::Cancelling | JobState::Done => {}
        }
    }

    fn arm(self: &Arc<Self>, inner: &mut JobInner, delay: Duration) {
        inner.generation += 1;
        inner.state = JobState::Scheduled;
        let generation = inner.generation;
        let job = Arc::clone(self);
        let handle = self.ctx.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job.run(generation).await;
        });
        inner.timer = Some(handle.abort_handle());
        debug!(job = %self.name, ?delay, generation, "job scheduled");
    }

    /// Execute one pass. Called by the timer task once the delay elapses.
    async fn run(self: Arc<Self>, generation: u64) {
        {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != JobState::Scheduled {
                debug!(job = %self.name, generation, "stale timer fired, skipping run");
                return;
            }
            inner.state = JobState::Running;
            inner.timer = None;
        }

        let event = RefreshEvent::started(&self.subscriber, self.refresh_type);
        info!(
            job = %self.name,
            refresh_type = ?self.refresh_type,
            roots = self.roots.len(),
            "refresh started"
        );
        self.ctx.registry.notify_started(&event);

        let started = Instant::now();
        let subscriber = Arc::clone(&self.subscriber);
        let roots = Arc::clone(&self.roots);
        let outcome = match tokio::task::spawn_blocking(move || subscriber.compare(&roots)).await {
            Ok(outcome) => outcome,
            Err(e) => Err(ComparisonError::Failed(format!("comparison task aborted: {}", e))),
        };
        let elapsed = started.elapsed();

        {
            let mut metrics = self.ctx.metrics.write().unwrap_or_else(PoisonError::into_inner);
            match &outcome {
                Ok(changes) => {
                    info!(
                        job = %self.name,
                        changes = changes.len(),
                        duration = ?elapsed,
                        "refresh done"
                    );
                    metrics.record_success(elapsed, changes.len());
                }
                Err(e) => {
                    warn!(
                        job = %self.name,
                        error = %e,
                        duration = ?elapsed,
                        "refresh comparison failed"
                    );
                    metrics.record_failure(elapsed);
                }
            }
        }

        let event = event.finish(outcome);
        self.ctx.registry.notify_done(&event);
        self.finish_run();
    }

    fn finish_run(self: &Arc<Self>) {
        let mut inner = self.lock();
        let rearm = match inner.state {
            JobState::Running => inner.policy.reschedule_after_run,
            JobState::Cancelling => inner.policy.restart_on_cancel,
            state => {
                warn!(job = %self.name, ?state, "run finished in unexpected state");
                false
            }
        };
        inner.state = JobState::Done;
        if rearm {
            self.arm(&mut inner, self.interval);
        } else {
            debug!(job = %self.name, "job done");
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
