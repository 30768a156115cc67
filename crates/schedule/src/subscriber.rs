use std::sync::Arc;

use resync_core::{ComparisonError, Root, SyncChange};

/// Performs the comparison behind a refresh.
///
/// `compare` may block for a long time; jobs run it on the blocking pool so
/// control operations never wait behind it.
pub trait Subscriber: Send + Sync {
    /// Name reported in refresh events and logs.
    fn name(&self) -> &str;

    /// Everything this subscriber can compare.
    fn roots(&self) -> Vec<Root>;

    /// Compare `roots` and return the differences found.
    fn compare(&self, roots: &[Root]) -> Result<Vec<SyncChange>, ComparisonError>;
}

/// The subscription a schedule refreshes.
pub trait RefreshTarget: Send + Sync {
    /// Display name used in logs and status text.
    fn name(&self) -> &str;

    /// The subscriber behind this target. Must return the same instance on
    /// every call: schedules match refresh events to their target by
    /// subscriber identity.
    fn subscriber(&self) -> Arc<dyn Subscriber>;

    /// Roots to hand to the next job, or `None` while they cannot be
    /// resolved yet. A schedule does not arm itself until this returns
    /// `Some`.
    fn resolve_roots(&self) -> Option<Vec<Root>> {
        Some(self.subscriber().roots())
    }
}
