//! refresh-worker -- keeps a set of directories under a periodic refresh
//! schedule and logs what each pass finds.
//!
//! Runs until Ctrl-C, then saves the schedule state (when `--state-file` is
//! given) and disposes the schedule.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use resync_core::{Config, ResyncError};
use resync_schedule::{
    DirectoryTarget, ListenerError, ListenerRegistry, MemoryStore, RefreshEvent, RefreshListener,
    RefreshSchedule, RefreshTarget, ScheduleContext, ScheduleStore, SnapshotSubscriber, Subscriber,
    refresh_event_as_string,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Periodic refresh worker for local directory trees.
#[derive(Parser, Debug)]
#[command(name = "refresh-worker", version, about)]
struct Cli {
    /// Directories to watch.
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Name shown in logs and status.
    #[arg(long, env = "RESYNC_TARGET_NAME", default_value = "workspace")]
    name: String,

    /// Refresh interval in seconds; overrides config and saved state.
    #[arg(long, env = "RESYNC_INTERVAL_OVERRIDE")]
    interval_secs: Option<u64>,

    /// JSON file the schedule state is restored from and saved to.
    #[arg(long, env = "RESYNC_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Turn periodic refresh on even if config or saved state has it off.
    /// The enabled flag is saved on shutdown.
    #[arg(long)]
    enable: bool,

    /// Skip the manual pass that records a baseline at startup.
    #[arg(long)]
    no_initial_refresh: bool,
}

// ── Change logger ───────────────────────────────────────────────────

struct ChangeLogger {
    subscriber: Arc<dyn Subscriber>,
}

impl RefreshListener for ChangeLogger {
    fn refresh_done(&self, event: &RefreshEvent) -> Result<(), ListenerError> {
        if !event.is_from(&self.subscriber) {
            return Ok(());
        }
        for change in event.changes() {
            info!(root = %change.root, path = %change.path, kind = %change.kind, "change detected");
        }
        info!(
            refresh_type = ?event.refresh_type(),
            status = ?event.status(),
            "last refresh: {}",
            refresh_event_as_string(Some(event))
        );
        Ok(())
    }
}

// ── State file ──────────────────────────────────────────────────────

fn load_store(path: &Path) -> Result<Option<MemoryStore>, ResyncError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let store = serde_json::from_str(&raw).map_err(|e| ResyncError::Serialize(e.to_string()))?;
    Ok(Some(store))
}

fn save_store(path: &Path, store: &MemoryStore) -> Result<(), ResyncError> {
    let raw =
        serde_json::to_string_pretty(store).map_err(|e| ResyncError::Serialize(e.to_string()))?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// Build the schedule from the state file when there is a usable one,
/// otherwise from `ctx.defaults`. Returns the loaded store so unrelated keys
/// survive the save on shutdown.
fn restore_schedule(
    state_file: Option<&Path>,
    target: &Arc<dyn RefreshTarget>,
    ctx: ScheduleContext,
) -> (RefreshSchedule, Option<MemoryStore>) {
    let store = match state_file.map(load_store) {
        Some(Ok(store)) => store,
        Some(Err(e)) => {
            warn!(error = %e, "failed to load state file, using configured defaults");
            None
        }
        None => None,
    };
    let schedule =
        RefreshSchedule::init(store.as_ref().map(|s| s as &dyn ScheduleStore), target, ctx);
    (schedule, store)
}

/// Let the schedule start. Whether it is enabled comes from the state file
/// or config unless `force_enable` is set.
fn start_schedule(schedule: &RefreshSchedule, force_enable: bool) {
    let enabled = force_enable || schedule.is_enabled();
    schedule.set_enabled(enabled, true);
    if !enabled {
        info!("periodic refresh is disabled (use --enable or RESYNC_REFRESH_ENABLED=true)");
    }
}

fn save_schedule(
    path: &Path,
    store: Option<MemoryStore>,
    schedule: &RefreshSchedule,
) -> Result<(), ResyncError> {
    let mut store = store.unwrap_or_default();
    schedule.save_state(&mut store);
    save_store(path, &store)
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    resync_core::config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let subscriber = Arc::new(SnapshotSubscriber::new(cli.name.clone(), cli.roots.clone()));
    let target: Arc<dyn RefreshTarget> =
        Arc::new(DirectoryTarget::new(cli.name.clone(), subscriber));

    let ctx = ScheduleContext::current()?.with_defaults(config.schedule);
    let (schedule, store) = restore_schedule(cli.state_file.as_deref(), &target, ctx);
    if let Some(secs) = cli.interval_secs {
        schedule.set_interval(secs)?;
    }

    let registry = ListenerRegistry::global();
    let logger_id = registry.add(Arc::new(ChangeLogger {
        subscriber: target.subscriber(),
    }));

    if !cli.no_initial_refresh && !schedule.refresh_now() {
        warn!(roots = ?cli.roots, "initial refresh skipped, roots unavailable");
    }
    start_schedule(&schedule, cli.enable);
    info!(status = %serde_json::to_string(&schedule.status())?, "refresh-worker started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    if let Some(path) = &cli.state_file {
        if let Err(e) = save_schedule(path, store, &schedule) {
            warn!(error = %e, path = %path.display(), "failed to save state file");
        }
    }

    let metrics = schedule.metrics();
    schedule.dispose();
    registry.remove(logger_id);
    info!(
        runs_completed = metrics.runs_completed,
        runs_failed = metrics.runs_failed,
        avg_run_duration = ?metrics.avg_run_duration,
        "refresh-worker exited cleanly"
    );

    Ok(())
}
