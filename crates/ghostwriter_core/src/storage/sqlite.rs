//! SQLite-backed blob storage.
//!
//! # Invariants
//! - Each write runs in its own `BEGIN IMMEDIATE` transaction; `update_blob`
//!   reads inside that same transaction.
//! - The wrapped connection has migrations applied (checked on construction).

use super::{BlobStorage, BlobUpdate, StorageError, StorageResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::note::epoch_millis_now;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

/// Blob storage over the `kv_store` table.
pub struct SqliteBlobStorage {
    conn: Connection,
}

impl SqliteBlobStorage {
    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match
    ///   this binary.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StorageError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Opens the database file at `path`, creating and migrating it as needed.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl BlobStorage for SqliteBlobStorage {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>> {
        select_value(&self.conn, key)
    }

    fn write_blob(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        upsert_value(&tx, key, value)?;
        tx.commit()?;
        Ok(())
    }

    fn update_blob(&mut self, key: &str, update: &mut BlobUpdate<'_>) -> StorageResult<bool> {
        // IMMEDIATE takes the write lock before the read, so no other
        // connection can commit between the two.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = select_value(&tx, key)?;
        let Some(next) = update(current.as_deref()) else {
            return Ok(false);
        };
        upsert_value(&tx, key, &next)?;
        tx.commit()?;
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn select_value(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1;",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

fn upsert_value(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, value, epoch_millis_now()],
    )?;
    Ok(())
}
