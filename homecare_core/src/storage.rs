//! Namespaced key/value storage on the local filesystem.
//!
//! Each key maps to `<dir>/<key>.json`. Values are replaced atomically and a
//! per-key lock file serializes read-modify-write cycles across threads and
//! processes.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory-backed key/value store
#[derive(Clone, Debug)]
pub struct LocalStorage {
    dir: PathBuf,
}

/// Exclusive lock on one storage key, released on drop
#[derive(Debug)]
pub struct KeyLock {
    file: File,
    key: String,
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release lock on '{}': {}", self.key, e);
        }
    }
}

fn persistence(action: &str, key: &str, e: impl std::fmt::Display) -> Error {
    Error::Persistence(format!("failed to {} '{}': {}", action, key, e))
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a key's value
    pub fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }

    fn check_key(key: &str) -> Result<()> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Persistence(format!("invalid storage key '{}'", key)));
        }
        Ok(())
    }

    fn ensure_dir(&self, key: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| persistence("create directory for", key, e))
    }

    /// Read a key's value, `None` if it was never written
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Self::check_key(key)?;
        let path = self.value_path(key);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Key '{}' not present at {:?}", key, path);
                return Ok(None);
            }
            Err(e) => return Err(persistence("open", key, e)),
        };

        // Acquire shared lock for reading
        file.lock_shared().map_err(|e| persistence("lock", key, e))?;

        let mut contents = String::new();
        let read = io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read.map_err(|e| persistence("read", key, e))?;

        tracing::debug!("Read {} bytes for key '{}'", contents.len(), key);
        Ok(Some(contents))
    }

    /// Replace a key's value
    ///
    /// Atomically writes the value by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::check_key(key)?;
        self.ensure_dir(key)?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| persistence("stage", key, e))?;
        {
            let mut writer = io::BufWriter::new(temp.as_file_mut());
            writer
                .write_all(value.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|e| persistence("write", key, e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| persistence("sync", key, e))?;

        // Atomically replace old value
        temp.persist(self.value_path(key))
            .map_err(|e| persistence("replace", key, e.error))?;

        tracing::debug!("Wrote {} bytes for key '{}'", value.len(), key);
        Ok(())
    }

    /// Delete a key; deleting a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        match std::fs::remove_file(self.value_path(key)) {
            Ok(()) => {
                tracing::debug!("Removed key '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence("remove", key, e)),
        }
    }

    /// Take the exclusive lock for a key, blocking until it is free
    pub fn lock(&self, key: &str) -> Result<KeyLock> {
        Self::check_key(key)?;
        self.ensure_dir(key)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path(key))
            .map_err(|e| persistence("open lock for", key, e))?;
        file.lock_exclusive()
            .map_err(|e| persistence("lock", key, e))?;

        Ok(KeyLock {
            file,
            key: key.to_string(),
        })
    }
}
