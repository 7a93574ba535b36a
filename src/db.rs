use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::{HistoryItem, HttpMethod};

/// SQLite-backed request history
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the history database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening history database {}", path.display()))?;
        Self::init(conn)
    }

    /// Database that lives only as long as the value
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                time_ms INTEGER NOT NULL,
                status INTEGER NOT NULL,
                status_text TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history database lock poisoned"))
    }

    /// Insert a new history item
    pub fn insert_history(&self, item: &HistoryItem) -> Result<i64> {
        let conn = self.conn()?;
        let timestamp = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO history (timestamp, method, url, time_ms, status, status_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                timestamp,
                item.method.as_str(),
                item.url,
                item.time as i64,
                item.status as i64,
                item.status_text,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Load recent history items, most recent first
    pub fn load_recent_history(&self, limit: usize) -> Result<Vec<HistoryItem>> {
        Ok(self
            .load_recent_rows(limit)?
            .into_iter()
            .map(|(_, item)| item)
            .collect())
    }

    /// Like `load_recent_history`, paired with each item's row id
    pub fn load_recent_rows(&self, limit: usize) -> Result<Vec<(i64, HistoryItem)>> {
        let conn = self.conn()?;

        // row id rather than timestamp, so items recorded in the same instant keep their order
        let mut stmt = conn.prepare(
            "SELECT id, method, url, time_ms, status, status_text
             FROM history
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let items = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let method: String = row.get(1)?;
            let time_ms: i64 = row.get(3)?;
            let status: i64 = row.get(4)?;

            let item = HistoryItem {
                method: HttpMethod::parse(&method).unwrap_or_default(),
                url: row.get(2)?,
                time: time_ms.max(0) as u64,
                status: u16::try_from(status).unwrap_or_default(),
                status_text: row.get(5)?,
            };
            Ok((id, item))
        })?;

        let mut result = Vec::new();
        for item in items {
            result.push(item?);
        }

        Ok(result)
    }

    /// Delete the `index`-th most recent item. Returns false when out of range.
    pub fn delete_nth_recent(&self, index: usize) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM history WHERE id =
                (SELECT id FROM history ORDER BY id DESC LIMIT 1 OFFSET ?1)",
            params![index as i64],
        )?;
        Ok(deleted > 0)
    }

    /// Delete a history item by ID. Returns false when no such row exists.
    pub fn delete_history(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM history WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Clear all history
    pub fn clear_all_history(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM history", [])?;
        Ok(())
    }

    /// Get total history count
    pub fn get_history_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
impl Database {
    /// Make every insert fail until `allow_inserts` is called.
    pub(crate) fn reject_inserts(&self) {
        self.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_insert BEFORE INSERT ON history
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
    }

    pub(crate) fn allow_inserts(&self) {
        self.conn()
            .unwrap()
            .execute_batch("DROP TRIGGER reject_insert;")
            .unwrap();
    }
}
