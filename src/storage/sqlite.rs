use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};

use super::{SlotStorage, WriteError};

/// Durable slot storage backed by a single SQLite table.
///
/// All access is synchronous; the connection lives behind a mutex because
/// the stores above it read and write in response to UI-driven events, not
/// from background tasks.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create storage directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open storage at {}", db_path.display()))?;

        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create slots table")?;

        info!("Slot storage initialized at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Transient storage for tools that should not leave files behind.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory storage")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create slots table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SlotStorage for SqliteStorage {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.lock_conn();
        let result = conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional();

        match result {
            Ok(value) => value,
            Err(err) => {
                error!("Failed to read slot '{key}': {err}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WriteError> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO slots (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|err| WriteError::Backend(err.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let conn = self.lock_conn();
        if let Err(err) = conn.execute("DELETE FROM slots WHERE key = ?1", params![key]) {
            error!("Failed to remove slot '{key}': {err}");
        }
    }
}
