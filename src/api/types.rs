//! Serde types matching the backend's wire format.
//!
//! Entity payloads live in `journal`; these are the envelopes and auxiliary
//! shapes the REST contract wraps around them.

use serde::{Deserialize, Serialize};

/// Every collection response wraps its payload as `{ "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
  pub data: T,
}

/// Structured error body: `{ "error": { "status", "name", "message" } }`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
  pub status: Option<u16>,
  pub name: Option<String>,
  pub message: Option<String>,
}

impl ApiErrorBody {
  /// Best-effort parse; anything unreadable is treated as an empty body.
  pub fn parse(text: &str) -> Self {
    serde_json::from_str(text).unwrap_or_default()
  }

  pub fn message(&self) -> Option<&str> {
    self
      .error
      .as_ref()
      .and_then(|e| e.message.as_deref())
      .filter(|m| !m.is_empty())
  }
}

/// Media descriptor returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedMedia {
  pub id: u64,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: u64,
  pub username: String,
  pub email: String,
  #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
  pub jwt: String,
  pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
  pub identifier: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
  pub username: &'a str,
  pub email: &'a str,
  pub password: &'a str,
}
