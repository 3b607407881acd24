//! SQLite key/value storage backing the preference store.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::PrefsError;

/// Schema for the preference table.
const PREFS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-based key/value storage.
#[derive(Clone)]
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self, PrefsError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| PrefsError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let conn = Connection::open(path)?;
    Self::from_connection(conn)
  }

  /// Open a throwaway store that lives only as long as the process.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, PrefsError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, PrefsError> {
    conn.execute_batch(PREFS_SCHEMA)?;
    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  /// Default database location: `$XDG_DATA_HOME/chacha/preferences.db`.
  pub fn default_path() -> Result<PathBuf, PrefsError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(PrefsError::NoDataDir)?;

    Ok(data_dir.join("chacha").join("preferences.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, PrefsError> {
    self.conn.lock().map_err(|_| PrefsError::Poisoned)
  }

  pub fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
    let conn = self.lock()?;
    let value = conn
      .query_row(
        "SELECT value FROM preferences WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  pub fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO preferences (key, value, updated_at)
       VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;
    Ok(())
  }

  pub fn remove(&self, key: &str) -> Result<(), PrefsError> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM preferences WHERE key = ?", params![key])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_get_remove() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "one").unwrap();
    store.set("k", "two").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
  }

  #[test]
  fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("prefs.db");

    SqliteStore::open(&path).unwrap().set("k", "v").unwrap();

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
  }
}
