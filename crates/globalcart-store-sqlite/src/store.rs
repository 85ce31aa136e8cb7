//! [`SqliteStore`], the SQLite implementation of [`KeyValueStore`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use globalcart_core::storage::KeyValueStore;
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;

use crate::{Error, Result, schema::SCHEMA};

fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// One stored value with its last write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  pub key:        String,
  pub value:      String,
  pub updated_at: DateTime<Utc>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Durable key-value storage backed by a single SQLite file.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    debug!(path = %path.display(), "opened sqlite store");
    Self::init(conn)
  }

  /// Open an in-memory store, useful for testing.
  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  // A poisoned connection is still usable; SQLite rolls back partial work.
  fn conn(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn get(&self, key: &str) -> Result<Option<String>> {
    let value = self
      .conn()
      .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
      .optional()?;
    Ok(value)
  }

  pub fn set(&self, key: &str, value: &str) -> Result<()> {
    self.conn().execute(
      "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
      params![key, value, encode_dt(Utc::now())],
    )?;
    Ok(())
  }

  pub fn delete(&self, key: &str) -> Result<bool> {
    let n = self.conn().execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(n > 0)
  }

  /// Every stored entry, ordered by key.
  pub fn entries(&self) -> Result<Vec<Entry>> {
    let conn = self.conn();
    let mut stmt = conn.prepare("SELECT key, value, updated_at FROM kv ORDER BY key")?;
    let raw = stmt
      .query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raw
      .into_iter()
      .map(|(key, value, updated_at)| {
        Ok(Entry { key, value, updated_at: decode_dt(&updated_at)? })
      })
      .collect()
  }
}

impl KeyValueStore for SqliteStore {
  fn get_raw(&self, key: &str) -> globalcart_core::Result<Option<String>> {
    Ok(self.get(key)?)
  }

  fn set_raw(&self, key: &str, value: &str) -> globalcart_core::Result<()> {
    Ok(self.set(key, value)?)
  }

  fn remove(&self, key: &str) -> globalcart_core::Result<()> {
    self.delete(key)?;
    Ok(())
  }
}
