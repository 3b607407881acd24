//! Pieces shared by every journal record: server metadata, media, relation
//! references and field validation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix of document ids minted for records the server has not confirmed.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

static PLACEHOLDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Server-assigned identity and timestamps carried by every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
  pub id: u64,
  #[serde(rename = "documentId")]
  pub document_id: String,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "updatedAt")]
  pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
  /// Metadata for an optimistic record that only exists client-side.
  pub fn placeholder(now: DateTime<Utc>) -> Self {
    let millis = now.timestamp_millis();
    let seq = PLACEHOLDER_SEQ.fetch_add(1, Ordering::Relaxed);
    Self {
      id: millis.unsigned_abs(),
      document_id: format!("{}{}-{}", PLACEHOLDER_PREFIX, millis, seq),
      created_at: now,
      updated_at: now,
    }
  }
}

/// A modification stamp strictly newer than `previous`.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = Utc::now();
  if now > previous {
    now
  } else {
    previous + Duration::milliseconds(1)
  }
}

/// Uploaded media as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
  pub id: u64,
  #[serde(rename = "documentId", default, skip_serializing_if = "Option::is_none")]
  pub document_id: Option<String>,
  pub url: String,
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub height: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub formats: Option<MediaFormats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormats {
  pub thumbnail: Option<MediaFormat>,
  pub small: Option<MediaFormat>,
  pub medium: Option<MediaFormat>,
  pub large: Option<MediaFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
  pub url: String,
}

impl Media {
  /// Smallest rendition available, falling back to the original.
  pub fn thumbnail_url(&self) -> &str {
    self
      .formats
      .as_ref()
      .and_then(|f| f.thumbnail.as_ref().or(f.small.as_ref()))
      .map(|f| f.url.as_str())
      .unwrap_or(&self.url)
  }
}

/// Absolute form of a media URL; relative paths resolve against the backend.
pub fn resolve_media_url(base_url: &str, url: &str) -> String {
  if url.is_empty() {
    return String::new();
  }
  if url.starts_with("http") {
    return url.to_string();
  }
  let base = base_url.trim_end_matches('/');
  if url.starts_with('/') {
    format!("{}{}", base, url)
  } else {
    format!("{}/{}", base, url)
  }
}

/// Reference to a related record, by numeric id or document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationRef {
  Id(u64),
  DocumentId(String),
}

impl FromStr for RelationRef {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.parse::<u64>() {
      Ok(id) => RelationRef::Id(id),
      Err(_) => RelationRef::DocumentId(s.to_string()),
    })
  }
}

/// Relations come back as `null` when empty on some endpoints.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
  #[error("{field} is required")]
  Required { field: &'static str },
  #[error("{field} must be between {min} and {max}")]
  OutOfRange {
    field: &'static str,
    min: i64,
    max: i64,
  },
  #[error("{field} must be a positive number")]
  NotPositive { field: &'static str },
  #[error("{field} must not be negative")]
  Negative { field: &'static str },
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
  if value.is_empty() {
    return Err(ValidationError::Required { field });
  }
  Ok(())
}

pub(crate) fn check_range(
  field: &'static str,
  value: Option<i64>,
  min: i64,
  max: i64,
) -> Result<(), ValidationError> {
  match value {
    Some(v) if v < min || v > max => Err(ValidationError::OutOfRange { field, min, max }),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_placeholders_are_unique() {
    let now = Utc::now();
    let a = RecordMeta::placeholder(now);
    let b = RecordMeta::placeholder(now);
    assert_ne!(a.document_id, b.document_id);
    assert!(a.document_id.starts_with(PLACEHOLDER_PREFIX));
  }

  #[test]
  fn test_next_updated_at_is_strictly_newer() {
    let future = Utc::now() + Duration::hours(1);
    assert!(next_updated_at(future) > future);

    let past = Utc::now() - Duration::hours(1);
    assert!(next_updated_at(past) > past);
  }

  #[test]
  fn test_resolve_media_url() {
    let base = "http://localhost:1337";
    assert_eq!(
      resolve_media_url(base, "/uploads/a.jpg"),
      "http://localhost:1337/uploads/a.jpg"
    );
    assert_eq!(
      resolve_media_url(base, "https://cdn.example.com/a.jpg"),
      "https://cdn.example.com/a.jpg"
    );
    assert_eq!(resolve_media_url(base, ""), "");
  }

  #[test]
  fn test_resolve_media_url_keeps_base_path() {
    let base = "https://example.com/backend/";
    assert_eq!(
      resolve_media_url(base, "/uploads/a.jpg"),
      "https://example.com/backend/uploads/a.jpg"
    );
    assert_eq!(
      resolve_media_url(base, "uploads/b.jpg"),
      "https://example.com/backend/uploads/b.jpg"
    );
  }

  #[test]
  fn test_relation_ref_parse_and_serialize() {
    assert_eq!("12".parse::<RelationRef>().unwrap(), RelationRef::Id(12));
    assert_eq!(
      "abc".parse::<RelationRef>().unwrap(),
      RelationRef::DocumentId("abc".to_string())
    );
    assert_eq!(
      serde_json::to_value(vec![RelationRef::Id(1), RelationRef::DocumentId("x".into())]).unwrap(),
      serde_json::json!([1, "x"])
    );
  }

  #[test]
  fn test_media_thumbnail_fallback() {
    let media: Media = serde_json::from_value(serde_json::json!({
      "id": 1,
      "url": "/uploads/full.jpg",
      "formats": { "thumbnail": { "url": "/uploads/thumb.jpg" } }
    }))
    .unwrap();
    assert_eq!(media.thumbnail_url(), "/uploads/thumb.jpg");

    let bare: Media = serde_json::from_value(serde_json::json!({ "id": 2, "url": "/u.jpg" })).unwrap();
    assert_eq!(bare.thumbnail_url(), "/u.jpg");
  }

  #[test]
  fn test_check_range() {
    assert!(check_range("rating", Some(3), 1, 5).is_ok());
    assert!(check_range("rating", None, 1, 5).is_ok());
    assert_eq!(
      check_range("rating", Some(6), 1, 5),
      Err(ValidationError::OutOfRange {
        field: "rating",
        min: 1,
        max: 5
      })
    );
  }
}
