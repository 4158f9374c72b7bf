use anyhow::Result;

/// A string key-value store. Implementations report failures honestly; the
/// resilient store decides what to do with them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

pub type StoreBox = Box<dyn KeyValueStore + Send + Sync>;
