use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cache::Cacheable;

use super::record::{require, Media, RecordMeta, ValidationError};
use super::resource::Resource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum TeawareStatus {
  #[default]
  Active,
  Broken,
  Sold,
}

impl fmt::Display for TeawareStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TeawareStatus::Active => "Active",
      TeawareStatus::Broken => "Broken",
      TeawareStatus::Sold => "Sold",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teaware {
  #[serde(flatten)]
  pub meta: RecordMeta,
  pub name: String,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub material: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub volume_ml: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<TeawareStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_favorite: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photo: Option<Media>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeawareDraft {
  pub name: String,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub material: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub volume_ml: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<TeawareStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_favorite: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeawarePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub material: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub volume_ml: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<TeawareStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_favorite: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo: Option<u64>,
}

fn validate_volume(volume_ml: Option<i32>) -> Result<(), ValidationError> {
  match volume_ml {
    Some(v) if v <= 0 => Err(ValidationError::NotPositive { field: "volume_ml" }),
    _ => Ok(()),
  }
}

impl Cacheable for Teaware {
  fn cache_key(&self) -> &str {
    &self.meta.document_id
  }

  fn entity_type() -> &'static str {
    "teaware"
  }
}

impl Resource for Teaware {
  type Draft = TeawareDraft;
  type Patch = TeawarePatch;

  const COLLECTION: &'static str = "teawares";
  const POPULATE: &'static [(&'static str, &'static str)] = &[("populate", "photo")];
  const RELATIONS: &'static [&'static str] = &["photo"];

  fn validate_draft(draft: &TeawareDraft) -> Result<(), ValidationError> {
    require("name", &draft.name)?;
    validate_volume(draft.volume_ml)
  }

  fn validate_patch(patch: &TeawarePatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
      require("name", name)?;
    }
    validate_volume(patch.volume_ml)
  }

  fn label(&self) -> String {
    match self.volume_ml {
      Some(ml) => format!("{} ({}ml)", self.name, ml),
      None => self.name.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_type_field_round_trip() {
    let teaware: Teaware = serde_json::from_value(json!({
      "id": 1,
      "documentId": "w1",
      "name": "Celadon gaiwan",
      "type": "Gaiwan",
      "volume_ml": 120,
      "status": "Broken",
      "createdAt": "2026-01-02T03:04:05.000Z",
      "updatedAt": "2026-01-02T03:04:05.000Z"
    }))
    .unwrap();

    assert_eq!(teaware.kind.as_deref(), Some("Gaiwan"));
    assert_eq!(teaware.status, Some(TeawareStatus::Broken));
    assert_eq!(teaware.label(), "Celadon gaiwan (120ml)");

    let patch = TeawarePatch {
      kind: Some("Cup".to_string()),
      ..Default::default()
    };
    assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "type": "Cup" }));
  }

  #[test]
  fn test_volume_must_be_positive() {
    let draft = TeawareDraft {
      name: "Pitcher".to_string(),
      volume_ml: Some(0),
      ..Default::default()
    };
    assert_eq!(
      Teaware::validate_draft(&draft),
      Err(ValidationError::NotPositive { field: "volume_ml" })
    );

    let patch = TeawarePatch {
      volume_ml: Some(200),
      ..Default::default()
    };
    assert!(Teaware::validate_patch(&patch).is_ok());
  }
}
