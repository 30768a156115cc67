use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use resync_core::{ComparisonError, SyncChange};
use serde::Serialize;
use uuid::Uuid;

use crate::subscriber::Subscriber;
use crate::types::{RefreshStatus, RefreshType};

/// The subscriber instance an event came from, compared by identity.
#[derive(Clone)]
struct Source(Arc<dyn Subscriber>);

impl Source {
    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({:p})", self.addr())
    }
}

/// Record of one refresh pass.
///
/// Created by a job when a run starts and finalized once when it ends.
/// Finalizing consumes the pending event, so a finished event cannot be
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshEvent {
    id: Uuid,
    subscriber: String,
    #[serde(skip)]
    source: Source,
    refresh_type: RefreshType,
    start_time: DateTime<Utc>,
    stop_time: Option<DateTime<Utc>>,
    changes: Vec<SyncChange>,
    status: RefreshStatus,
}

impl RefreshEvent {
    /// A pending event for `subscriber`, starting now.
    pub fn started(subscriber: &Arc<dyn Subscriber>, refresh_type: RefreshType) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriber: subscriber.name().to_string(),
            source: Source(Arc::clone(subscriber)),
            refresh_type,
            start_time: Utc::now(),
            stop_time: None,
            changes: Vec::new(),
            status: RefreshStatus::Pending,
        }
    }

    /// Finalize with the comparison outcome. A failure yields an empty
    /// change set and a `Failed` status.
    ///
    /// The stop time is strictly after the start time, even when the clock
    /// has not advanced between the two readings.
    pub fn finish(self, outcome: Result<Vec<SyncChange>, ComparisonError>) -> Self {
        let (changes, status) = match outcome {
            Ok(changes) => (changes, RefreshStatus::Ok),
            Err(e) => (Vec::new(), RefreshStatus::Failed(e.to_string())),
        };
        Self {
            stop_time: Some(Utc::now().max(self.start_time + TimeDelta::nanoseconds(1))),
            changes,
            status,
            ..self
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the subscriber that produced this event.
    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    /// Whether this event was produced by exactly `subscriber` (the same
    /// instance, not merely the same name).
    pub fn is_from(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.source.addr() == Arc::as_ptr(subscriber) as *const ()
    }

    pub fn refresh_type(&self) -> RefreshType {
        self.refresh_type
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// `None` until the event is finished.
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    pub fn changes(&self) -> &[SyncChange] {
        &self.changes
    }

    pub fn status(&self) -> &RefreshStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        self.stop_time.is_some()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RefreshStatus::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resync_core::{ChangeKind, Root};

    use crate::testing::{MockSubscriber, pending_event};

    #[test]
    fn started_event_is_pending() {
        let event = pending_event("git", RefreshType::Scheduled);
        assert_eq!(event.subscriber(), "git");
        assert!(!event.is_finished());
        assert!(event.stop_time().is_none());
        assert_eq!(event.status(), &RefreshStatus::Pending);
    }

    #[test]
    fn finish_with_changes() {
        let change = SyncChange::new(Root::from("r"), "a.txt", ChangeKind::Incoming);
        let event = pending_event("git", RefreshType::Manual);
        let id = event.id();
        let event = event.finish(Ok(vec![change.clone()]));

        assert_eq!(event.id(), id);
        assert_eq!(event.changes(), &[change]);
        assert_eq!(event.status(), &RefreshStatus::Ok);
        assert!(event.start_time() < event.stop_time().unwrap());
        assert_eq!(event.refresh_type(), RefreshType::Manual);
    }

    #[test]
    fn finish_with_failure_has_no_changes() {
        let event = pending_event("git", RefreshType::Scheduled)
            .finish(Err(ComparisonError::Failed("network down".to_string())));
        assert!(event.is_finished());
        assert!(event.is_failed());
        assert!(event.changes().is_empty());
    }

    #[test]
    fn identity_distinguishes_same_named_subscribers() {
        let first: Arc<dyn Subscriber> = MockSubscriber::new("git");
        let second: Arc<dyn Subscriber> = MockSubscriber::new("git");
        let event = RefreshEvent::started(&first, RefreshType::Scheduled);

        assert!(event.is_from(&first));
        assert!(event.is_from(&Arc::clone(&first)));
        assert!(!event.is_from(&second));

        let finished = event.finish(Ok(Vec::new()));
        assert!(finished.is_from(&first));
    }

    #[test]
    fn serialized_event_omits_source() {
        let event = pending_event("git", RefreshType::Scheduled).finish(Ok(Vec::new()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["subscriber"], "git");
        assert!(json.get("source").is_none());
    }
}
