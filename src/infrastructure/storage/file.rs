#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path;

use anyhow::Result;

use crate::domain::models::KeyValueStore;

/// Persists entries as a flat YAML map in a single file. Nothing touches the
/// filesystem until the first operation.
pub struct FileStore {
    pub file_path: path::PathBuf,
}

impl FileStore {
    pub fn new(file_path: path::PathBuf) -> FileStore {
        return FileStore { file_path };
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let payload = match fs::read_to_string(&self.file_path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };

        if payload.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let entries: BTreeMap<String, String> = serde_yaml::from_str(&payload)?;
        return Ok(entries);
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.file_path, serde_yaml::to_string(entries)?)?;
        return Ok(());
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        return Ok(self.read_entries()?.remove(key));
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        return self.write_entries(&entries);
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }

        return self.write_entries(&entries);
    }
}
