//! Error types for the backend client.

use crate::journal::ValidationError;
use crate::prefs::PrefsError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// The backend answered 401. Stored credentials have already been cleared.
  #[error("Unauthorized: session expired, run `chacha login` again")]
  Unauthorized,
  /// Any other failure talking to the backend.
  #[error("{message}")]
  RequestFailed {
    status: Option<u16>,
    message: String,
  },
  #[error("Invalid input: {0}")]
  Validation(#[from] ValidationError),
  /// A cached value did not decode into the requested type.
  #[error("Cache error: {0}")]
  Cache(#[source] serde_json::Error),
  #[error(transparent)]
  Preferences(#[from] PrefsError),
}

impl ApiError {
  pub(crate) fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
    Self::RequestFailed {
      status,
      message: message.into(),
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized)
  }

  /// HTTP status behind the failure, when there was one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized => Some(401),
      Self::RequestFailed { status, .. } => *status,
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    Self::request_failed(
      err.status().map(|s| s.as_u16()),
      format!("Request failed: {}", err),
    )
  }
}
