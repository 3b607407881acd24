//! Persisted local preferences.
//!
//! Small key/value settings that live outside the query cache:
//! - the auth token and cached user profile
//! - locale and theme
//! - user-editable tea category and teaware type lists
//!
//! Values are read on demand and written only on explicit user action, so
//! last-write-wins is all the coordination they need.

mod storage;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use storage::SqliteStore;

pub const JWT_KEY: &str = "chacha_jwt";
pub const USER_KEY: &str = "chacha_user";
pub const LOCALE_KEY: &str = "chacha_locale";
pub const DARK_MODE_KEY: &str = "chacha_dark_mode";
pub const TEA_CATEGORIES_KEY: &str = "chacha_tea_categories";
pub const TEAWARE_TYPES_KEY: &str = "chacha_teaware_types";

/// Keys written by releases that still used the old app name.
const LEGACY_KEYS: &[(&str, &str)] = &[
  ("tealog_jwt", JWT_KEY),
  ("tealog_user", USER_KEY),
  ("tealog_locale", LOCALE_KEY),
  ("tealog_dark_mode", DARK_MODE_KEY),
];

pub const DEFAULT_TEA_CATEGORIES: &[&str] = &[
  "Green",
  "White",
  "Oolong",
  "Black",
  "Sheng_Puerh",
  "Shou_Puerh",
  "Herbal",
];

pub const DEFAULT_TEAWARE_TYPES: &[&str] = &["Gaiwan", "Yixing_Pot", "Glass_Pot", "Pitcher", "Cup"];

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
  #[error("preference database error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("failed to encode preference: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("failed to create data directory {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("could not determine data directory")]
  NoDataDir,
  #[error("preference store lock poisoned")]
  Poisoned,
}

/// UI language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Locale {
  #[default]
  Ko,
  En,
}

impl Locale {
  pub fn code(self) -> &'static str {
    match self {
      Locale::Ko => "ko",
      Locale::En => "en",
    }
  }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Locale {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ko" => Ok(Locale::Ko),
      "en" => Ok(Locale::En),
      other => Err(format!("unsupported locale: {}", other)),
    }
  }
}

/// Which user-editable tag list to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TagList {
  TeaCategories,
  TeawareTypes,
}

impl TagList {
  fn key(self) -> &'static str {
    match self {
      TagList::TeaCategories => TEA_CATEGORIES_KEY,
      TagList::TeawareTypes => TEAWARE_TYPES_KEY,
    }
  }

  fn defaults(self) -> &'static [&'static str] {
    match self {
      TagList::TeaCategories => DEFAULT_TEA_CATEGORIES,
      TagList::TeawareTypes => DEFAULT_TEAWARE_TYPES,
    }
  }
}

/// Human-readable form of a stored tag (`Sheng_Puerh` -> `Sheng Puerh`).
pub fn display_tag(value: &str) -> String {
  value.replace('_', " ")
}

/// Typed access to the persisted preference store.
#[derive(Clone)]
pub struct Preferences {
  store: SqliteStore,
}

impl Preferences {
  /// Open the store at its default location, migrating legacy keys.
  pub fn open() -> Result<Self, PrefsError> {
    let path = SqliteStore::default_path()?;
    Self::with_store(SqliteStore::open(&path)?)
  }

  #[cfg(test)]
  pub fn in_memory() -> Result<Self, PrefsError> {
    Self::with_store(SqliteStore::open_in_memory()?)
  }

  pub fn with_store(store: SqliteStore) -> Result<Self, PrefsError> {
    let prefs = Self { store };
    prefs.migrate_legacy_keys()?;
    Ok(prefs)
  }

  /// Move values from `tealog_*` keys to their current names.
  ///
  /// A value already present under the new key wins; the legacy value is then
  /// left alone.
  fn migrate_legacy_keys(&self) -> Result<(), PrefsError> {
    for (old_key, new_key) in LEGACY_KEYS {
      if let Some(value) = self.store.get(old_key)? {
        if self.store.get(new_key)?.is_none() {
          self.store.set(new_key, &value)?;
          self.store.remove(old_key)?;
          tracing::info!(from = old_key, to = new_key, "migrated legacy preference");
        }
      }
    }
    Ok(())
  }

  pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PrefsError> {
    match self.store.get(key)? {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PrefsError> {
    self.store.set(key, &serde_json::to_string(value)?)
  }

  // -- auth slot --

  pub fn token(&self) -> Result<Option<String>, PrefsError> {
    self.store.get(JWT_KEY)
  }

  pub fn set_token(&self, jwt: &str) -> Result<(), PrefsError> {
    self.store.set(JWT_KEY, jwt)
  }

  /// Forget the token and the cached user profile.
  pub fn clear_auth(&self) -> Result<(), PrefsError> {
    self.store.remove(JWT_KEY)?;
    self.store.remove(USER_KEY)
  }

  // -- display --

  pub fn locale(&self) -> Result<Locale, PrefsError> {
    Ok(
      self
        .store
        .get(LOCALE_KEY)?
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default(),
    )
  }

  pub fn set_locale(&self, locale: Locale) -> Result<(), PrefsError> {
    self.store.set(LOCALE_KEY, locale.code())
  }

  /// Stored dark-mode flag, or `fallback` when the user never chose one.
  pub fn dark_mode(&self, fallback: bool) -> Result<bool, PrefsError> {
    Ok(match self.store.get(DARK_MODE_KEY)? {
      Some(raw) => raw == "true",
      None => fallback,
    })
  }

  pub fn set_dark_mode(&self, dark: bool) -> Result<(), PrefsError> {
    self.store.set(DARK_MODE_KEY, if dark { "true" } else { "false" })
  }

  // -- tag lists --

  /// Current tag list; unreadable stored JSON falls back to the defaults.
  pub fn tags(&self, list: TagList) -> Result<Vec<String>, PrefsError> {
    let stored = self
      .store
      .get(list.key())?
      .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok());

    Ok(stored.unwrap_or_else(|| list.defaults().iter().map(|s| s.to_string()).collect()))
  }

  /// Append a tag unless it is already present. Returns the new list.
  pub fn add_tag(&self, list: TagList, name: &str) -> Result<Vec<String>, PrefsError> {
    let mut tags = self.tags(list)?;
    if tags.iter().any(|t| t == name) {
      return Ok(tags);
    }
    tags.push(name.to_string());
    self.set_json(list.key(), &tags)?;
    Ok(tags)
  }

  /// Remove every occurrence of a tag. Returns the new list.
  pub fn remove_tag(&self, list: TagList, name: &str) -> Result<Vec<String>, PrefsError> {
    let tags: Vec<String> = self
      .tags(list)?
      .into_iter()
      .filter(|t| t != name)
      .collect();
    self.set_json(list.key(), &tags)?;
    Ok(tags)
  }
}
