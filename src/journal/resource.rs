use serde::Serialize;

use crate::cache::Cacheable;

use super::record::ValidationError;

/// A backend collection whose records can be listed, fetched, created,
/// updated and deleted.
pub trait Resource: Cacheable + 'static {
  /// Create payload.
  type Draft: Serialize + Send + Sync + 'static;
  /// Update payload; unset fields are left alone by the server.
  type Patch: Serialize + Send + Sync + 'static;

  /// Path segment and cache key, e.g. `tea-leaves`
  const COLLECTION: &'static str;

  /// Query pairs sent with single-record reads.
  const POPULATE: &'static [(&'static str, &'static str)];

  /// Payload fields that reference other records. They go to the server but
  /// are never projected into the cache.
  const RELATIONS: &'static [&'static str];

  fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

  fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

  /// Short human label, used in command output.
  fn label(&self) -> String;
}
