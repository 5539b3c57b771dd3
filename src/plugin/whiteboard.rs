//! Shared key/value scratch space for intercommunication between a
//! plugin's remotes and actions (§3 "Plugin... whiteboard").

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct Whiteboard {
    entries: DashMap<String, Value>,
}

impl Whiteboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
