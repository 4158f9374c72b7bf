#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use anyhow::Result;
use dashmap::DashMap;

use crate::domain::models::KeyValueStore;

/// Process scoped map used whenever persistence is unavailable.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn value(&self, key: &str) -> Option<String> {
        return self.entries.get(key).map(|val| return val.to_string());
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        return Ok(self.value(key));
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        return Ok(());
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.delete(key);
        return Ok(());
    }
}
