use serde::{Deserialize, Serialize};

use crate::cache::Cacheable;

use super::record::{check_range, null_as_empty, require, Media, RecordMeta, RelationRef, ValidationError};
use super::resource::Resource;
use super::tea::TeaLeaf;
use super::teaware::Teaware;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewLog {
  #[serde(flatten)]
  pub meta: RecordMeta,
  pub brewed_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub water_temp: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub water_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub leaf_amount_g: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub steeping_details: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub review: Option<String>,
  /// Populated on single-record reads only
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tea: Option<TeaLeaf>,
  #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
  pub teawares: Vec<Teaware>,
  #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
  pub photos: Vec<Media>,
}

impl BrewLog {
  /// Calendar date of the brew (`YYYY-MM-DD`).
  pub fn brew_date(&self) -> &str {
    self.brewed_at.get(..10).unwrap_or(&self.brewed_at)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrewLogDraft {
  pub brewed_at: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub water_temp: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub water_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub leaf_amount_g: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub steeping_details: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rating: Option<u8>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tea: Option<RelationRef>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub teawares: Vec<RelationRef>,
  /// Ids of uploaded media files
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub photos: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrewLogPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub brewed_at: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub water_temp: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub water_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub leaf_amount_g: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub steeping_details: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rating: Option<u8>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tea: Option<RelationRef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub teawares: Option<Vec<RelationRef>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photos: Option<Vec<u64>>,
}

fn validate_measures(
  water_temp: Option<i32>,
  leaf_amount_g: Option<f64>,
  rating: Option<u8>,
) -> Result<(), ValidationError> {
  check_range("water_temp", water_temp.map(i64::from), 0, 100)?;
  if leaf_amount_g.is_some_and(|g| g < 0.0 || g.is_nan()) {
    return Err(ValidationError::Negative {
      field: "leaf_amount_g",
    });
  }
  check_range("rating", rating.map(i64::from), 1, 5)
}

impl Cacheable for BrewLog {
  fn cache_key(&self) -> &str {
    &self.meta.document_id
  }

  fn entity_type() -> &'static str {
    "brew_log"
  }
}

impl Resource for BrewLog {
  type Draft = BrewLogDraft;
  type Patch = BrewLogPatch;

  const COLLECTION: &'static str = "brew-logs";
  const POPULATE: &'static [(&'static str, &'static str)] = &[
    ("populate[tea][populate]", "cover_photo"),
    ("populate[teawares][populate]", "photo"),
    ("populate", "photos"),
  ];
  const RELATIONS: &'static [&'static str] = &["tea", "teawares", "photos"];

  fn validate_draft(draft: &BrewLogDraft) -> Result<(), ValidationError> {
    require("brewed_at", &draft.brewed_at)?;
    validate_measures(draft.water_temp, draft.leaf_amount_g, draft.rating)
  }

  fn validate_patch(patch: &BrewLogPatch) -> Result<(), ValidationError> {
    if let Some(brewed_at) = &patch.brewed_at {
      require("brewed_at", brewed_at)?;
    }
    validate_measures(patch.water_temp, patch.leaf_amount_g, patch.rating)
  }

  fn label(&self) -> String {
    let tea = self.tea.as_ref().map(|t| t.name.as_str()).unwrap_or("?");
    match self.rating {
      Some(rating) => format!("{} {} {}", self.brew_date(), tea, "*".repeat(rating as usize)),
      None => format!("{} {}", self.brew_date(), tea),
    }
  }
}
