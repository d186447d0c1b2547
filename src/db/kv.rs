//! String key-value persistence.
//!
//! The session store only needs get/set/remove over opaque JSON strings,
//! so that is the whole seam. SQLite backs it in production and tests.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Insert or overwrite.
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool, DatabaseError>;
}

/// `kv_entries` table over one owned connection.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (creating parent directories as needed) and migrate.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }

    /// Flush cached statements and close the connection.
    pub fn close(self) -> Result<(), DatabaseError> {
        self.conn.flush_prepared_statement_cache();
        self.conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .prepare_cached("SELECT value FROM kv_entries WHERE key = ?1")?
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn
            .prepare_cached(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )?
            .execute(params![key, value])?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .prepare_cached("DELETE FROM kv_entries WHERE key = ?1")?
            .execute(params![key])?;
        Ok(removed > 0)
    }
}
