//! Process-wide registry of refresh listeners.
//!
//! Dispatch iterates over a snapshot of the listener list taken when the
//! broadcast starts, so listeners may add or remove listeners (including
//! themselves) from inside a callback. Individual listener failures, whether
//! returned errors or panics, are logged and don't block other listeners.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::event::RefreshEvent;

/// Error returned by a listener callback.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),
}

/// Receives refresh lifecycle notifications.
pub trait RefreshListener: Send + Sync {
    /// A run has started. `event` is still pending.
    fn refresh_started(&self, _event: &RefreshEvent) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A run has finished. `event` is final.
    fn refresh_done(&self, event: &RefreshEvent) -> Result<(), ListenerError>;
}

/// Handle returned by [`ListenerRegistry::add`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Entries = Arc<Vec<(ListenerId, Arc<dyn RefreshListener>)>>;

/// Copy-on-write listener set shared by every schedule in the process.
pub struct ListenerRegistry {
    listeners: RwLock<Entries>,
    next_id: AtomicU64,
}

static GLOBAL: OnceLock<Arc<ListenerRegistry>> = OnceLock::new();

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ListenerRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ListenerRegistry::new())))
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add(&self, listener: Arc<dyn RefreshListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push((id, listener));
        *guard = Arc::new(next);
        debug!(listener = id.0, "refresh listener added");
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = guard
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *guard = Arc::new(next);
        debug!(listener = id.0, "refresh listener removed");
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Broadcast "refresh started". Returns the number of listeners that failed.
    pub fn notify_started(&self, event: &RefreshEvent) -> usize {
        self.dispatch("refresh_started", event, |l, e| l.refresh_started(e))
    }

    /// Broadcast "refresh done". Returns the number of listeners that failed.
    pub fn notify_done(&self, event: &RefreshEvent) -> usize {
        self.dispatch("refresh_done", event, |l, e| l.refresh_done(e))
    }

    fn snapshot(&self) -> Entries {
        Arc::clone(&self.listeners.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn dispatch<F>(&self, callback: &str, event: &RefreshEvent, f: F) -> usize
    where
        F: Fn(&dyn RefreshListener, &RefreshEvent) -> Result<(), ListenerError>,
    {
        // The read lock is released before any callback runs.
        let listeners = self.snapshot();
        let mut failures = 0;

        for (id, listener) in listeners.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(listener.as_ref(), event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    warn!(
                        listener = id.0,
                        callback,
                        subscriber = event.subscriber(),
                        error = %e,
                        "refresh listener failed"
                    );
                }
                Err(payload) => {
                    failures += 1;
                    warn!(
                        listener = id.0,
                        callback,
                        subscriber = event.subscriber(),
                        panic = panic_message(payload.as_ref()),
                        "refresh listener panicked"
                    );
                }
            }
        }

        failures
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
