//! Key-value storage port with file-backed and in-memory implementations.
//!
//! The file store keeps one file per key and uses file locking so that
//! two CLI processes never observe a half-written value.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// String-keyed storage of string values
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Directory-backed store, one file per key
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the key files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Persistence(format!("invalid store key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Sidecar file whose lock guards every access to one key
    fn lock_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }

    fn open_lock(&self, key: &str) -> Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path_for(key))?;
        Ok(file)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock(key)?;
        lock.lock_shared()?;

        let read = match File::open(&path) {
            Ok(file) => {
                let mut contents = String::new();
                std::io::BufReader::new(file)
                    .read_to_string(&mut contents)
                    .map(|_| Some(contents))
            }
            // Removed between the existence check and the lock
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        };
        lock.unlock()?;

        let contents = read?;
        tracing::debug!("Read key '{}' from {:?}", key, path);
        Ok(contents)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let lock = self.open_lock(key)?;
        lock.lock_exclusive()?;

        let written = (|| -> Result<()> {
            // Temp file in the same directory for atomic rename
            let temp = NamedTempFile::new_in(&self.dir)?;
            {
                let mut writer = std::io::BufWriter::new(temp.as_file());
                writer.write_all(value.as_bytes())?;
                writer.flush()?;
            }
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })();
        lock.unlock()?;
        written?;

        tracing::debug!("Wrote key '{}' to {:?}", key, path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(());
        }

        let lock = self.open_lock(key)?;
        lock.lock_exclusive()?;
        let removed = match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed key '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
        lock.unlock()?;
        removed
    }
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
