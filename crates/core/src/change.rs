use serde::{Deserialize, Serialize};

/// Identifies something a comparison pass should examine (a project, a
/// folder, a repository path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Root(String);

impl Root {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Root {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Root {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Direction of a difference between local and remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Incoming,
    Outgoing,
    Conflicting,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Incoming => write!(f, "incoming"),
            ChangeKind::Outgoing => write!(f, "outgoing"),
            ChangeKind::Conflicting => write!(f, "conflicting"),
        }
    }
}

/// One comparison result: a path under a root that differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncChange {
    pub root: Root,
    pub path: String,
    pub kind: ChangeKind,
}

impl SyncChange {
    pub fn new(root: Root, path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            root,
            path: path.into(),
            kind,
        }
    }
}
