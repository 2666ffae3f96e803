//! SQLite cache implementation
//!
//! This module provides a SQLite-based implementation of the PageCache trait.

use crate::cache::schema::initialize_schema;
use crate::cache::traits::{CacheError, CacheResult, PageCache};
use crate::cache::CacheEntry;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite page cache
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (or creates) the cache database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCache)` - Successfully opened/created database
    /// * `Err(CacheError)` - Failed to open database or create the schema
    pub fn new(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened page cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory cache (for tests and throwaway runs)
    pub fn new_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl PageCache for SqliteCache {
    fn get(&self, url: &str) -> CacheResult<Option<String>> {
        let conn = self.conn()?;
        let text = conn
            .query_row(
                "SELECT text FROM page_text WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    fn put(&self, url: &str, text: &str) -> CacheResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO page_text (url, text, last_updated) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET text = excluded.text, last_updated = excluded.last_updated",
            params![url, text, now],
        )?;
        Ok(())
    }

    fn get_entry(&self, url: &str) -> CacheResult<Option<CacheEntry>> {
        let row: Option<(String, String, String)> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT url, text, last_updated FROM page_text WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
        };

        row.map(|(url, text, last_updated)| {
            let last_updated = DateTime::parse_from_rfc3339(&last_updated)
                .map_err(|e| CacheError::Corrupt {
                    url: url.clone(),
                    message: e.to_string(),
                })?
                .with_timezone(&Utc);
            Ok(CacheEntry {
                url,
                text,
                last_updated,
            })
        })
        .transpose()
    }

    fn count(&self) -> CacheResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM page_text", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn clear(&self) -> CacheResult<u64> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM page_text", [])?;
        Ok(removed as u64)
    }
}
