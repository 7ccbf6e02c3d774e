//! SQLite-backed key-value store.
//!
//! # Invariants
//! - Every row is keyed by `(scope, key)`; one store instance only ever sees
//!   its own scope.
//! - `set` is an upsert; the previous value is replaced whole.

use super::{KeyValueStore, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Durable store that mirrors browser origin storage on top of SQLite.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
    scope: String,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) a database file and scopes access to `scope`.
    pub fn open(path: impl AsRef<Path>, scope: impl Into<String>) -> StorageResult<Self> {
        Ok(Self::with_connection(open_db(path)?, scope))
    }

    pub fn open_in_memory(scope: impl Into<String>) -> StorageResult<Self> {
        Ok(Self::with_connection(open_db_in_memory()?, scope))
    }

    /// Wraps an already migrated connection.
    pub fn with_connection(conn: Connection, scope: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns stored keys for this scope, sorted.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT key FROM kv_entries WHERE scope = ?1 ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([self.scope.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .lock()
            .query_row(
                "SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2;",
                params![self.scope.as_str(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock().execute(
            "INSERT INTO kv_entries (scope, key, value, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT (scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.scope.as_str(), key, value],
        )?;
        debug!(
            "event=kv_set module=storage status=ok key={key} bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let removed = self.lock().execute(
            "DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2;",
            params![self.scope.as_str(), key],
        )?;
        debug!("event=kv_remove module=storage status=ok key={key} removed={removed}");
        Ok(())
    }
}
