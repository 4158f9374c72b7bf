#[cfg(test)]
#[path = "key_store_test.rs"]
mod tests;

use std::path;

use dashmap::DashSet;

use crate::domain::models::KeyValueStore;
use crate::domain::models::StoreBox;
use crate::domain::models::WallpaperError;
use crate::infrastructure::storage::file::FileStore;
use crate::infrastructure::storage::memory::MemoryStore;

/// Key-value store that never fails its callers. Every write also lands in an
/// in-memory map, so a session always reads back what it wrote even when the
/// persistent layer is missing or broken.
pub struct ResilientStore {
    persistent: Option<StoreBox>,
    memory: MemoryStore,
    // Keys whose last persistent write or removal failed. The persistent copy
    // is stale for these, so reads are served from memory.
    diverged: DashSet<String>,
}

impl ResilientStore {
    pub fn new(persistent: Option<StoreBox>) -> ResilientStore {
        return ResilientStore {
            persistent,
            memory: MemoryStore::default(),
            diverged: DashSet::new(),
        };
    }

    pub fn memory_only() -> ResilientStore {
        return ResilientStore::new(None);
    }

    /// An empty path means there is nowhere to persist to.
    pub fn from_path(file_path: &str) -> ResilientStore {
        if file_path.trim().is_empty() {
            tracing::warn!("No storage location available, credentials will not outlive this session");
            return ResilientStore::memory_only();
        }

        return ResilientStore::new(Some(Box::new(FileStore::new(path::PathBuf::from(
            file_path,
        )))));
    }

    pub fn is_persistent(&self) -> bool {
        return self.persistent.is_some();
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.diverged.contains(key) {
            return self.memory.value(key);
        }

        if let Some(store) = &self.persistent {
            match store.get(key) {
                Ok(Some(val)) => return Some(val),
                Ok(None) => {}
                Err(err) => absorb("get", key, err),
            }
        }

        return self.memory.value(key);
    }

    pub fn set(&self, key: &str, value: &str) {
        self.memory.insert(key, value);
        self.write_through("set", key, |store| return store.set(key, value));
    }

    pub fn remove(&self, key: &str) {
        self.memory.delete(key);
        self.write_through("remove", key, |store| return store.remove(key));
    }

    fn write_through<F>(&self, operation: &str, key: &str, write: F)
    where
        F: FnOnce(&StoreBox) -> anyhow::Result<()>,
    {
        let Some(store) = &self.persistent else {
            return;
        };

        match write(store) {
            Ok(()) => {
                self.diverged.remove(key);
            }
            Err(err) => {
                absorb(operation, key, err);
                self.diverged.insert(key.to_string());
            }
        }
    }
}

fn absorb(operation: &str, key: &str, err: anyhow::Error) {
    let err = WallpaperError::StorageUnavailable(format!("{err:#}"));
    tracing::warn!(
        operation = operation,
        key = key,
        error = %err,
        "Falling back to in-memory storage"
    );
}
