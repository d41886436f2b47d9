use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use tempfile::NamedTempFile;

use crate::error::StorageError;

/// Directory under the user data dir used by [`FileStore::default_root`].
pub const DEFAULT_STORE_DIR: &str = "swgplan/store";

/// Minimal key-value persistence used for templates.
///
/// Values are JSON documents; writes replace the previous value (last write wins).
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Keep a copy of the value under `key` at [`aside_key`] so the next write
    /// cannot replace it.
    fn set_aside(&self, key: &str) -> Result<(), StorageError> {
        match self.load(key)? {
            Some(value) => self.store(&aside_key(key), &value),
            None => Ok(()),
        }
    }
}

/// Key a set-aside value is kept under.
pub fn aside_key(key: &str) -> String {
    format!("{key}.corrupt")
}

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORE_DIR)
    }

    /// Directory holding the stored documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the given key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_component(key)))
    }

    /// File a set-aside value of the given key is moved to.
    pub fn aside_path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json.corrupt", sanitize_component(key)))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::unavailable(key, err)),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| StorageError::unavailable(key, err))?;

        // Write beside the target so the rename stays on one filesystem.
        let mut temp =
            NamedTempFile::new_in(&self.root).map_err(|err| StorageError::unavailable(key, err))?;
        temp.write_all(value.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(|err| StorageError::unavailable(key, err))?;
        temp.persist(self.path_for(key))
            .map_err(|err| StorageError::unavailable(key, err.error))?;
        Ok(())
    }

    fn set_aside(&self, key: &str) -> Result<(), StorageError> {
        match fs::rename(self.path_for(key), self.aside_path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::unavailable(key, err)),
        }
    }
}

/// In-process store for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn sanitize_component(input: &str) -> String {
    let result: String = input
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        .collect();
    if result.is_empty() {
        "store".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.load("swg-character-templates")?, None);
        store.store("swg-character-templates", "[1]")?;
        store.store("swg-character-templates", "[2]")?;
        assert_eq!(store.load("swg-character-templates")?.as_deref(), Some("[2]"));
        assert!(store.path_for("swg-character-templates").exists());

        let leftovers = fs::read_dir(store.root())?.count();
        assert_eq!(leftovers, 1, "temporary files must not linger");
        Ok(())
    }

    #[test]
    fn unreadable_root_is_unavailable() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory")?;

        let store = FileStore::new(&blocker);
        let err = store.store("key", "{}").expect_err("root is a file");
        assert!(matches!(err, StorageError::Unavailable { ref key, .. } if key == "key"));
        Ok(())
    }

    #[test]
    fn file_store_moves_values_aside() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());
        store.set_aside("absent")?;

        store.store("key", "{broken")?;
        store.set_aside("key")?;
        assert_eq!(store.load("key")?, None);
        assert_eq!(fs::read_to_string(store.aside_path_for("key"))?, "{broken");

        store.store("key", "[]")?;
        assert_eq!(fs::read_to_string(store.aside_path_for("key"))?, "{broken");
        Ok(())
    }

    #[test]
    fn memory_store_overwrites() -> Result<()> {
        let store = MemoryStore::new();
        store.store("k", "a")?;
        store.store("k", "b")?;
        assert_eq!(store.load("k")?.as_deref(), Some("b"));
        assert_eq!(store.load("missing")?, None);
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("swg/../templates?"), "swgtemplates");
        assert_eq!(sanitize_component("///"), "store");
    }
}
