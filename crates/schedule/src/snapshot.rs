//! Filesystem subscriber comparing modification-time snapshots of directory
//! trees between passes.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use resync_core::{ChangeKind, ComparisonError, Root, SyncChange};
use walkdir::WalkDir;

use crate::subscriber::{RefreshTarget, Subscriber};

type Snapshot = BTreeMap<String, SystemTime>;

/// Reports files added, modified or removed under each root since the
/// previous pass. The first pass over a root records a baseline and reports
/// nothing.
pub struct SnapshotSubscriber {
    name: String,
    roots: Vec<PathBuf>,
    previous: Mutex<HashMap<Root, Snapshot>>,
}

impl SnapshotSubscriber {
    pub fn new(name: impl Into<String>, roots: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            roots,
            previous: Mutex::new(HashMap::new()),
        }
    }

    fn scan(dir: &Path) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for entry in WalkDir::new(dir).follow_links(true).into_iter() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "walkdir error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(t)) => t,
                _ => continue,
            };
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            snapshot.insert(relative.to_string_lossy().into_owned(), modified);
        }
        snapshot
    }
}

fn diff(root: &Root, before: &Snapshot, after: &Snapshot) -> Vec<SyncChange> {
    let mut changes = Vec::new();
    for (path, modified) in after {
        match before.get(path) {
            Some(prev) if prev == modified => {}
            _ => changes.push(SyncChange::new(root.clone(), path.clone(), ChangeKind::Outgoing)),
        }
    }
    for path in before.keys().filter(|p| !after.contains_key(*p)) {
        changes.push(SyncChange::new(root.clone(), path.clone(), ChangeKind::Outgoing));
    }
    changes
}

impl Subscriber for SnapshotSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn roots(&self) -> Vec<Root> {
        self.roots
            .iter()
            .map(|p| Root::new(p.to_string_lossy().into_owned()))
            .collect()
    }

    fn compare(&self, roots: &[Root]) -> Result<Vec<SyncChange>, ComparisonError> {
        let mut changes = Vec::new();
        for root in roots {
            let dir = Path::new(root.as_str());
            if !dir.is_dir() {
                return Err(ComparisonError::Unavailable(format!("{} is not a directory", root)));
            }
            let current = Self::scan(dir);
            let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(before) = previous.get(root) {
                changes.extend(diff(root, before, &current));
            }
            previous.insert(root.clone(), current);
        }
        Ok(changes)
    }
}

/// A named set of directories kept fresh by a [`SnapshotSubscriber`].
///
/// Roots resolve only while every directory exists.
pub struct DirectoryTarget {
    name: String,
    subscriber: Arc<SnapshotSubscriber>,
}

impl DirectoryTarget {
    pub fn new(name: impl Into<String>, subscriber: Arc<SnapshotSubscriber>) -> Self {
        Self {
            name: name.into(),
            subscriber,
        }
    }
}

impl RefreshTarget for DirectoryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriber(&self) -> Arc<dyn Subscriber> {
        self.subscriber.clone()
    }

    fn resolve_roots(&self) -> Option<Vec<Root>> {
        if self.subscriber.roots.iter().all(|p| p.is_dir()) {
            Some(self.subscriber.roots())
        } else {
            None
        }
    }
}
