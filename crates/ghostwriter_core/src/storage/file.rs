//! File-backed blob storage.
//!
//! One `<key>.json` file per key inside a data directory. Writes go to a
//! temporary file in the same directory which is flushed, synced and then
//! renamed over the target.
//!
//! Every write holds an exclusive advisory lock on `<key>.lock`, so writers
//! in other processes serialize with `update_blob` cycles.

use super::{BlobStorage, BlobUpdate, StorageError, StorageResult};
use fs2::FileExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

static STORAGE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid storage key regex"));

/// Blob storage writing one JSON file per key.
pub struct FileBlobStorage {
    dir: PathBuf,
}

impl FileBlobStorage {
    /// Uses `dir` as the data directory, creating it when missing.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn blob_path(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self.dir.join(format!("{}.json", checked_key(key)?)))
    }

    /// Blocks until this process holds the write lock for `key`.
    ///
    /// The lock is released when the returned handle drops.
    fn lock_key(&self, key: &str) -> StorageResult<File> {
        let path = self.dir.join(format!("{}.lock", checked_key(key)?));
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;
        Ok(file)
    }

    fn replace_file(&self, path: &Path, value: &str) -> StorageResult<()> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Same directory as the target so the rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(value.as_bytes()).map_err(io_err)?;
        staged.flush().map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

fn checked_key(key: &str) -> StorageResult<&str> {
    if STORAGE_KEY_RE.is_match(key) {
        Ok(key)
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn read_file(path: PathBuf) -> StorageResult<Option<String>> {
    match fs::read_to_string(&path) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StorageError::Io { path, source }),
    }
}

impl BlobStorage for FileBlobStorage {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>> {
        read_file(self.blob_path(key)?)
    }

    fn write_blob(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.blob_path(key)?;
        let _lock = self.lock_key(key)?;
        self.replace_file(&path, value)
    }

    fn update_blob(&mut self, key: &str, update: &mut BlobUpdate<'_>) -> StorageResult<bool> {
        let path = self.blob_path(key)?;
        let _lock = self.lock_key(key)?;
        let current = read_file(path.clone())?;
        let Some(next) = update(current.as_deref()) else {
            return Ok(false);
        };
        self.replace_file(&path, &next)?;
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
