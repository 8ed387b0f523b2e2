//! Named blob storage backends.
//!
//! # Responsibility
//! - Define the contract for the medium holding the serialized note
//!   collection.
//! - Provide SQLite and plain-file implementations.
//!
//! # Invariants
//! - `write_blob` replaces the stored value atomically: readers observe either
//!   the previous value or the new one, never a mix.
//! - A failed `write_blob` leaves the previous value in place.
//! - `update_blob` holds exclusive access across its read and write, so
//!   concurrent read-modify-write cycles serialize instead of interleaving.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file;
mod sqlite;

pub use file::FileBlobStorage;
pub use sqlite::SqliteBlobStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Callback of [`BlobStorage::update_blob`]: current value in, replacement out.
pub type BlobUpdate<'a> = dyn FnMut(Option<&str>) -> Option<String> + 'a;

/// Error raised by a blob backend.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Key cannot be mapped onto the backend's namespace.
    InvalidKey(String),
    /// Connection was handed over before migrations ran.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::InvalidKey(key) => write!(f, "invalid storage key: `{key}`"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::InvalidKey(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Medium holding one value per key.
pub trait BlobStorage {
    /// Reads the value stored under `key`; `None` when nothing was written.
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key` as a whole.
    fn write_blob(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Read-modify-write of `key` under exclusive access.
    ///
    /// `update` sees the current value and returns the replacement, or
    /// `None` to leave the value untouched. No other writer can commit
    /// between the read and the write. Returns whether a value was written.
    fn update_blob(&mut self, key: &str, update: &mut BlobUpdate<'_>) -> StorageResult<bool>;
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

impl<T: BlobStorage + ?Sized> BlobStorage for Box<T> {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read_blob(key)
    }

    fn write_blob(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).write_blob(key, value)
    }

    fn update_blob(&mut self, key: &str, update: &mut BlobUpdate<'_>) -> StorageResult<bool> {
        (**self).update_blob(key, update)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
