//! SQLite-backed cache store.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheError, CacheNamespace, CacheStore, StoredEntry};

/// Persistent store; survives restarts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its table.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                payload TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_cache_entries_sequence
                ON cache_entries(namespace, sequence);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredEntry> {
        let stored_at_str: String = row.get(2)?;
        let stored_at = DateTime::parse_from_rfc3339(&stored_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let sequence: i64 = row.get(3)?;

        Ok(StoredEntry {
            key: row.get(0)?,
            payload: row.get(1)?,
            stored_at,
            sequence: sequence.max(0) as u64,
        })
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Result<Option<StoredEntry>, CacheError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT key, payload, stored_at, sequence FROM cache_entries
             WHERE namespace = ?1 AND key = ?2",
            params![namespace.as_str(), key],
            Self::row_to_entry,
        )
        .optional()
        .map_err(|e| CacheError::Database(e.to_string()))
    }

    async fn put(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
    ) -> Result<StoredEntry, CacheError> {
        let conn = self.lock()?;
        let next: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(sequence), 0) + 1 FROM cache_entries",
                [],
                |row| row.get(0),
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        let stored_at = Utc::now();

        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (namespace, key, payload, stored_at, sequence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                namespace.as_str(),
                key,
                payload,
                stored_at.to_rfc3339(),
                next
            ],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(StoredEntry {
            key: key.to_string(),
            payload,
            stored_at,
            sequence: next as u64,
        })
    }

    async fn remove(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace.as_str(), key],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn entries(&self, namespace: CacheNamespace) -> Result<Vec<StoredEntry>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT key, payload, stored_at, sequence FROM cache_entries
                 WHERE namespace = ?1 ORDER BY sequence ASC",
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![namespace.as_str()], Self::row_to_entry)
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CacheError::Database(e.to_string()))?);
        }
        Ok(entries)
    }
}
