use serde::{Deserialize, Serialize};

use crate::cache::Cacheable;

use super::record::{check_range, require, Media, RecordMeta, ValidationError};
use super::resource::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaLeaf {
  #[serde(flatten)]
  pub meta: RecordMeta,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub brand_origin: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub year: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub in_stock: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tasting_notes: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_photo: Option<Media>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeaLeafDraft {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub brand_origin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub year: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub in_stock: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tasting_notes: Option<String>,
  /// Id of an uploaded media file
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cover_photo: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeaLeafPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub brand_origin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub year: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub in_stock: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tasting_notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cover_photo: Option<u64>,
}

fn validate_year(year: Option<i32>) -> Result<(), ValidationError> {
  check_range("year", year.map(i64::from), 1900, 2100)
}

impl Cacheable for TeaLeaf {
  fn cache_key(&self) -> &str {
    &self.meta.document_id
  }

  fn entity_type() -> &'static str {
    "tea_leaf"
  }
}

impl Resource for TeaLeaf {
  type Draft = TeaLeafDraft;
  type Patch = TeaLeafPatch;

  const COLLECTION: &'static str = "tea-leaves";
  const POPULATE: &'static [(&'static str, &'static str)] = &[("populate", "cover_photo")];
  const RELATIONS: &'static [&'static str] = &["cover_photo"];

  fn validate_draft(draft: &TeaLeafDraft) -> Result<(), ValidationError> {
    require("name", &draft.name)?;
    validate_year(draft.year)
  }

  fn validate_patch(patch: &TeaLeafPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
      require("name", name)?;
    }
    validate_year(patch.year)
  }

  fn label(&self) -> String {
    match self.year {
      Some(year) => format!("{} ({})", self.name, year),
      None => self.name.clone(),
    }
  }
}
