//! Durable SQLite-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::fetch::ResponseKind;

use super::traits::{CacheStore, CachedResponse};

/// SQLite-backed cache store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create store directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open store database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store, used by tests and ephemeral hosts.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("pathpatrol").join("offline-cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run store migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for versioned stores.
const STORE_SCHEMA: &str = r#"
-- One row per deployed cache version
CREATE TABLE IF NOT EXISTS stores (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Captured responses, keyed by request descriptor digest
CREATE TABLE IF NOT EXISTS responses (
    store_name TEXT NOT NULL,
    descriptor TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    url TEXT NOT NULL,
    kind TEXT NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (store_name, descriptor),
    FOREIGN KEY (store_name) REFERENCES stores(name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_responses_store ON responses(store_name);
"#;

#[async_trait]
impl CacheStore for SqliteStore {
  async fn create_store(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("INSERT OR IGNORE INTO stores (name) VALUES (?)", params![name])
      .map_err(|e| eyre!("Failed to create store {}: {}", name, e))?;

    Ok(())
  }

  async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT status, headers, body, url, kind, cached_at FROM responses
         WHERE store_name = ? AND descriptor = ?",
      )
      .map_err(|e| eyre!("Failed to prepare lookup: {}", e))?;

    let row = stmt
      .query_row(params![store, key], |row| {
        Ok((
          row.get::<_, u16>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, Vec<u8>>(2)?,
          row.get::<_, String>(3)?,
          row.get::<_, String>(4)?,
          row.get::<_, String>(5)?,
        ))
      })
      .optional()
      .map_err(|e| eyre!("Failed to look up entry: {}", e))?;

    match row {
      Some((status, headers, body, url, kind, cached_at)) => {
        let headers: BTreeMap<String, String> = serde_json::from_str(&headers)
          .map_err(|e| eyre!("Failed to deserialize headers: {}", e))?;
        Ok(Some(CachedResponse {
          status,
          headers,
          body,
          url,
          kind: ResponseKind::parse(&kind)?,
          cached_at: parse_datetime(&cached_at)?,
        }))
      }
      None => Ok(None),
    }
  }

  async fn put(&self, store: &str, key: &str, entry: CachedResponse) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let headers = serde_json::to_string(&entry.headers)
      .map_err(|e| eyre!("Failed to serialize headers: {}", e))?;

    conn
      .execute("INSERT OR IGNORE INTO stores (name) VALUES (?)", params![store])
      .map_err(|e| eyre!("Failed to create store {}: {}", store, e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO responses (store_name, descriptor, status, headers, body, url, kind, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
          store,
          key,
          entry.status,
          headers,
          entry.body,
          entry.url,
          entry.kind.as_str(),
          entry.cached_at.to_rfc3339(),
        ],
      )
      .map_err(|e| eyre!("Failed to store entry: {}", e))?;

    Ok(())
  }

  async fn keys(&self, store: &str) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT descriptor FROM responses WHERE store_name = ?")
      .map_err(|e| eyre!("Failed to prepare key listing: {}", e))?;

    let keys = stmt
      .query_map(params![store], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list keys: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(keys)
  }

  async fn list_stores(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM stores ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare store listing: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list stores: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  async fn delete_store(&self, name: &str) -> Result<bool> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM responses WHERE store_name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete entries of {}: {}", name, e))?;

    let deleted = conn
      .execute("DELETE FROM stores WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete store {}: {}", name, e))?;

    Ok(deleted > 0)
  }
}

/// Parse an RFC 3339 timestamp written by `put`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse timestamp '{}': {}", s, e))
}
