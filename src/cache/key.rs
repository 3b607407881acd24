//! Logical query identifiers.

use std::fmt;

/// Address of one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  /// Every record of a collection, e.g. `tea-leaves`
  List { collection: &'static str },
  /// One record of a collection, e.g. `tea-leaves/abc123`
  Detail {
    collection: &'static str,
    document_id: String,
  },
  /// A standalone query such as the daily sentences or the weather
  Named(&'static str),
}

impl QueryKey {
  pub fn list(collection: &'static str) -> Self {
    Self::List { collection }
  }

  pub fn detail(collection: &'static str, document_id: impl Into<String>) -> Self {
    Self::Detail {
      collection,
      document_id: document_id.into(),
    }
  }

  pub fn named(name: &'static str) -> Self {
    Self::Named(name)
  }

  /// Collection this key belongs to, if any.
  pub fn collection(&self) -> Option<&'static str> {
    match self {
      Self::List { collection } | Self::Detail { collection, .. } => Some(collection),
      Self::Named(_) => None,
    }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::List { collection } => f.write_str(collection),
      Self::Detail {
        collection,
        document_id,
      } => write!(f, "{}/{}", collection, document_id),
      Self::Named(name) => f.write_str(name),
    }
  }
}
