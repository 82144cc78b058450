//! SQLite row storage
//!
//! Synchronous table access for the disk cache. Every method runs on a
//! blocking thread with the connection mutex held.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::cache::current_timestamp_ms;
use crate::config::{DiskCacheOptions, COUNT_CACHE_WINDOW};
use crate::error::{CacheError, Result};

static TABLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid"));

// == Disk Target ==
/// Where the disk cache keeps its table.
pub enum DiskTarget {
    /// Database file, created if missing
    Path(PathBuf),
    /// Private in-memory database
    Memory,
    /// An already open connection
    Connection(Connection),
}

impl DiskTarget {
    fn open(self) -> Result<Connection> {
        match self {
            DiskTarget::Path(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| CacheError::Config(format!("cannot create {}: {}", parent.display(), e)))?;
                }
                Ok(Connection::open(path)?)
            }
            DiskTarget::Memory => Ok(Connection::open_in_memory()?),
            DiskTarget::Connection(connection) => Ok(connection),
        }
    }
}

impl From<&Path> for DiskTarget {
    fn from(path: &Path) -> Self {
        DiskTarget::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for DiskTarget {
    fn from(path: PathBuf) -> Self {
        DiskTarget::Path(path)
    }
}

impl From<&str> for DiskTarget {
    fn from(path: &str) -> Self {
        DiskTarget::Path(PathBuf::from(path))
    }
}

impl From<Connection> for DiskTarget {
    fn from(connection: Connection) -> Self {
        DiskTarget::Connection(connection)
    }
}

// == Count Cache ==
/// Row count remembered for a short window to avoid `COUNT(*)` per insert.
#[derive(Debug)]
struct CountCache {
    disabled: bool,
    window: Duration,
    count: Option<u64>,
    refreshed_at: Option<Instant>,
}

impl CountCache {
    fn new(disabled: bool, window: Duration) -> Self {
        Self {
            disabled,
            window,
            count: None,
            refreshed_at: None,
        }
    }

    /// The cached count, if one is held and still inside its window.
    fn known(&self) -> Option<u64> {
        match (self.count, self.refreshed_at) {
            (Some(count), Some(at)) if at.elapsed() < self.window => Some(count),
            _ => None,
        }
    }

    fn store(&mut self, count: u64) {
        if self.disabled {
            return;
        }
        self.count = Some(count);
        self.refreshed_at = Some(Instant::now());
    }

    fn increment(&mut self) {
        if let Some(count) = self.known() {
            self.count = Some(count + 1);
        }
    }

    fn decrement(&mut self) {
        if let Some(count) = self.known() {
            self.count = Some(count.saturating_sub(1));
        }
    }

    fn invalidate(&mut self) {
        self.count = None;
        self.refreshed_at = None;
    }
}

// == Disk Store ==
/// One cache table plus its row-count bookkeeping.
#[derive(Debug)]
pub(crate) struct DiskStore {
    conn: Connection,
    table: String,
    max_items: Option<u64>,
    count: CountCache,
}

impl DiskStore {
    // == Open ==
    /// Opens `target`, applies pragmas and creates the table if missing.
    pub(crate) fn open(target: DiskTarget, options: &DiskCacheOptions) -> Result<Self> {
        if !TABLE_NAME_PATTERN.is_match(&options.table_name) {
            return Err(CacheError::Config(format!(
                "invalid table name \"{}\"",
                options.table_name
            )));
        }

        let conn = target.open()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;\n")?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            options.table_name
        ))?;

        Ok(Self {
            conn,
            table: options.table_name.clone(),
            max_items: options.max_items,
            count: CountCache::new(options.disable_count_cache, COUNT_CACHE_WINDOW),
        })
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", self.table);
        let value = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    // == Set ==
    /// Upserts `value` and enforces the row cap on inserts.
    ///
    /// Returns true when the key was newly inserted.
    pub(crate) fn set(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        let inserted = self.upsert(key, value)?;
        if !inserted {
            return Ok(false);
        }

        self.count.increment();
        if let Some(max_items) = self.max_items {
            if self.count()? > max_items {
                if let Some(evicted) = self.evict_oldest()? {
                    debug!("Evicted oldest row {} from {}", evicted, self.table);
                }
            }
        }

        Ok(true)
    }

    /// Single-statement insert-or-update.
    ///
    /// `created_at == updated_at` only on insert: an update always moves
    /// `updated_at` past `created_at`, even within the same millisecond.
    fn upsert(&self, key: &str, value: &[u8]) -> Result<bool> {
        let sql = format!(
            "INSERT INTO {t} (key, value, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = MAX(excluded.updated_at, {t}.created_at + 1)
             RETURNING created_at, updated_at",
            t = self.table
        );
        let now = current_timestamp_ms() as i64;
        let (created_at, updated_at): (i64, i64) = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key, value, now], |row| Ok((row.get(0)?, row.get(1)?)))?;

        Ok(created_at == updated_at)
    }

    /// Deletes the row with the smallest `created_at`, ties going to the
    /// earliest inserted.
    fn evict_oldest(&mut self) -> Result<Option<String>> {
        let sql = format!(
            "DELETE FROM {t} WHERE key = (SELECT key FROM {t} ORDER BY created_at ASC, rowid ASC LIMIT 1)
             RETURNING key",
            t = self.table
        );
        let evicted: Option<String> = self.conn.query_row(&sql, [], |row| row.get(0)).optional()?;
        if evicted.is_some() {
            self.count.decrement();
        }
        Ok(evicted)
    }

    // == Has ==
    pub(crate) fn has(&self, key: &str) -> Result<bool> {
        if self.count.known() == Some(0) {
            return Ok(false);
        }

        let sql = format!("SELECT 1 FROM {} WHERE key = ?1", self.table);
        let found = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    pub(crate) fn delete(&mut self, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", self.table);
        let changes = self.conn.prepare_cached(&sql)?.execute(params![key])?;
        if changes > 0 {
            self.count.decrement();
        }
        Ok(changes > 0)
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        self.conn.execute(&format!("DELETE FROM {}", self.table), [])?;
        self.count.store(0);
        Ok(())
    }

    // == Count ==
    /// Row count, served from the count cache while it is fresh.
    pub(crate) fn count(&mut self) -> Result<u64> {
        if let Some(count) = self.count.known() {
            return Ok(count);
        }

        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        let count = count as u64;
        self.count.store(count);
        Ok(count)
    }

    // == Purge ==
    /// Deletes rows last written before `cutoff_ms`.
    pub(crate) fn purge_older_than(&mut self, cutoff_ms: u64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE updated_at < ?1", self.table);
        let removed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params![cutoff_ms as i64])?;
        if removed > 0 {
            self.count.invalidate();
        }
        Ok(removed)
    }

    pub(crate) fn keys(&self) -> Result<Vec<String>> {
        let sql = format!("SELECT key FROM {} ORDER BY created_at ASC, rowid ASC", self.table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub(crate) fn rows(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let sql = format!("SELECT key, value FROM {} ORDER BY created_at ASC, rowid ASC", self.table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, Vec<u8>)>, _>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub(crate) fn timestamps(&self, key: &str) -> Result<Option<(i64, i64)>> {
        let sql = format!("SELECT created_at, updated_at FROM {} WHERE key = ?1", self.table);
        Ok(self
            .conn
            .query_row(&sql, params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?)
    }
}
