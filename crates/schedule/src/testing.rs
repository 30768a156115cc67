//! Mock collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, mpsc as std_mpsc};

use resync_core::{ComparisonError, Root, SyncChange};
use tokio::sync::mpsc;

use crate::event::RefreshEvent;
use crate::job::JobContext;
use crate::metrics::RefreshMetrics;
use crate::registry::{ListenerError, ListenerRegistry, RefreshListener};
use crate::subscriber::{RefreshTarget, Subscriber};
use crate::types::RefreshType;

type Outcome = Result<Vec<SyncChange>, ComparisonError>;

/// Subscriber returning scripted outcomes, then empty change sets.
pub(crate) struct MockSubscriber {
    name: String,
    calls: AtomicUsize,
    script: Mutex<VecDeque<Outcome>>,
    gate: Mutex<Option<std_mpsc::Receiver<()>>>,
    panics: bool,
}

impl MockSubscriber {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Self::with_results(name, Vec::new())
    }

    pub(crate) fn with_results(name: &str, results: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            script: Mutex::new(results.into()),
            gate: Mutex::new(None),
            panics: false,
        })
    }

    /// Each comparison blocks until the returned sender releases it.
    pub(crate) fn gated(name: &str) -> (Arc<Self>, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        let sub = Arc::new(Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            gate: Mutex::new(Some(rx)),
            panics: false,
        });
        (sub, tx)
    }

    pub(crate) fn panicking(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            gate: Mutex::new(None),
            panics: true,
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Subscriber for MockSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn roots(&self) -> Vec<Root> {
        vec![Root::from("project")]
    }

    fn compare(&self, _roots: &[Root]) -> Result<Vec<SyncChange>, ComparisonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            let _ = gate.recv();
        }
        if self.panics {
            panic!("subscriber {} blew up", self.name);
        }
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Target whose roots can be toggled unavailable.
pub(crate) struct MockTarget {
    subscriber: Arc<MockSubscriber>,
    ready: AtomicBool,
}

impl MockTarget {
    pub(crate) fn new(subscriber: Arc<MockSubscriber>) -> Arc<Self> {
        Arc::new(Self {
            subscriber,
            ready: AtomicBool::new(true),
        })
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl RefreshTarget for MockTarget {
    fn name(&self) -> &str {
        "Mock Participant"
    }

    fn subscriber(&self) -> Arc<dyn Subscriber> {
        self.subscriber.clone()
    }

    fn resolve_roots(&self) -> Option<Vec<Root>> {
        if self.ready.load(Ordering::SeqCst) {
            Some(self.subscriber.roots())
        } else {
            None
        }
    }
}

/// A pending event from a fresh mock subscriber named `name`.
pub(crate) fn pending_event(name: &str, refresh_type: RefreshType) -> RefreshEvent {
    let subscriber: Arc<dyn Subscriber> = MockSubscriber::new(name);
    RefreshEvent::started(&subscriber, refresh_type)
}

#[derive(Debug)]
pub(crate) enum Notice {
    Started(RefreshEvent),
    Done(RefreshEvent),
}

/// Forwards every notification for one subscriber onto a channel.
pub(crate) struct RecordingListener {
    subscriber: String,
    tx: mpsc::UnboundedSender<Notice>,
}

impl RecordingListener {
    pub(crate) fn new(subscriber: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Arc::new(Self {
            subscriber: subscriber.to_string(),
            tx,
        });
        (listener, rx)
    }
}

impl RefreshListener for RecordingListener {
    fn refresh_started(&self, event: &RefreshEvent) -> Result<(), ListenerError> {
        if event.subscriber() == self.subscriber {
            let _ = self.tx.send(Notice::Started(event.clone()));
        }
        Ok(())
    }

    fn refresh_done(&self, event: &RefreshEvent) -> Result<(), ListenerError> {
        if event.subscriber() == self.subscriber {
            let _ = self.tx.send(Notice::Done(event.clone()));
        }
        Ok(())
    }
}

/// A job context on the current runtime with a private registry and a
/// recording listener for subscriber "git".
pub(crate) fn context() -> (JobContext, Arc<ListenerRegistry>, mpsc::UnboundedReceiver<Notice>) {
    let registry = Arc::new(ListenerRegistry::new());
    let (listener, rx) = RecordingListener::new("git");
    registry.add(listener);
    let ctx = JobContext {
        registry: registry.clone(),
        runtime: tokio::runtime::Handle::current(),
        metrics: Arc::new(RwLock::new(RefreshMetrics::default())),
    };
    (ctx, registry, rx)
}
