//! Key/value persistence boundary for schedule configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of the enabled flag, stored as the string `"true"` or `"false"`.
pub const KEY_ENABLED: &str = "resync.schedule.enabled";

/// Key of the refresh interval, stored as an integer number of seconds.
pub const KEY_INTERVAL: &str = "resync.schedule.interval";

/// Primitive store a schedule saves its state into and restores it from.
pub trait ScheduleStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_integer(&self, key: &str) -> Option<i64>;
    fn put_string(&mut self, key: &str, value: &str);
    fn put_integer(&mut self, key: &str, value: i64);
}

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Integer(i64),
    String(String),
}

/// In-memory store. Serializable, so callers can write it wherever they keep
/// their settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    values: BTreeMap<String, StoreValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ScheduleStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            StoreValue::String(s) => Some(s.clone()),
            StoreValue::Integer(_) => None,
        }
    }

    fn get_integer(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            StoreValue::Integer(n) => Some(*n),
            StoreValue::String(_) => None,
        }
    }

    fn put_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), StoreValue::String(value.to_string()));
    }

    fn put_integer(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), StoreValue::Integer(value));
    }
}
