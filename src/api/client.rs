//! Authenticated REST client for the journal backend.

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::prefs::Preferences;

use super::error::ApiError;
use super::types::{ApiErrorBody, UploadedMedia};

/// Backend client.
///
/// Every `/api` request carries the stored bearer token when there is one.
/// A 401 answer clears the stored session before the error reaches the caller.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  prefs: Preferences,
}

impl ApiClient {
  pub fn new(base_url: &str, prefs: Preferences) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("chacha/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      prefs,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn prefs(&self) -> &Preferences {
    &self.prefs
  }

  fn api_url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url, path)
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.request(Method::GET, path, &[], None).await
  }

  pub async fn get_with_query<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<T, ApiError> {
    self.request(Method::GET, path, query, None).await
  }

  pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let body = to_body(body)?;
    self.request(Method::POST, path, &[], Some(&body)).await
  }

  pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let body = to_body(body)?;
    self.request(Method::PUT, path, &[], Some(&body)).await
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.request(Method::DELETE, path, &[], None).await
  }

  async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, &str)],
    body: Option<&Value>,
  ) -> Result<T, ApiError> {
    tracing::debug!(%method, path, "api request");

    let mut request = self.http.request(method, self.api_url(path));
    if !query.is_empty() {
      request = request.query(query);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = self.authorize(request)?.send().await?;
    self.parse_response(response, "Request failed").await
  }

  /// Upload a file as multipart form data. Returns the first stored media.
  pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedMedia, ApiError> {
    let part = Part::bytes(bytes).file_name(file_name.to_string());
    let form = Form::new().part("files", part);

    tracing::debug!(file_name, "uploading media");

    let request = self.http.post(self.api_url("/upload")).multipart(form);
    let response = self.authorize(request)?.send().await?;
    let uploaded: Value = self.parse_response(response, "Upload failed").await?;

    let first = match uploaded {
      Value::Array(items) => items.into_iter().next(),
      other @ Value::Object(_) => Some(other),
      _ => None,
    }
    .ok_or_else(|| ApiError::request_failed(None, "Upload failed: empty response"))?;

    serde_json::from_value(first).map_err(|e| {
      ApiError::request_failed(None, format!("Upload failed: unexpected response ({})", e))
    })
  }

  /// Read a file from disk and upload it.
  pub async fn upload_file(&self, path: &Path) -> Result<UploadedMedia, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
      ApiError::request_failed(
        None,
        format!("Upload failed: cannot read {}: {}", path.display(), e),
      )
    })?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());

    self.upload(&file_name, bytes).await
  }

  /// POST to an `/api` endpoint that needs no session (login, register).
  ///
  /// No token is attached and a 401 is reported like any other failure.
  pub(crate) async fn post_public<T, B>(
    &self,
    path: &str,
    body: &B,
    fallback: &str,
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let response = self.http.post(self.api_url(path)).json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(error_from_response(response, |_| fallback.to_string()).await);
    }
    decode_body(status, response).await
  }

  /// GET a static asset served next to the API (`<base>/<path>`), without
  /// credentials.
  pub async fn get_asset<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(ApiError::request_failed(
        Some(status.as_u16()),
        format!("Failed to fetch {}", path),
      ));
    }
    decode_body(status, response).await
  }

  fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
    Ok(match self.prefs.token()? {
      Some(token) => request.bearer_auth(token),
      None => request,
    })
  }

  async fn parse_response<T: DeserializeOwned>(
    &self,
    response: Response,
    fallback: &str,
  ) -> Result<T, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
      self.expire_session();
      return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
      return Err(error_from_response(response, |code| format!("{}: {}", fallback, code)).await);
    }

    decode_body(status, response).await
  }

  fn expire_session(&self) {
    if let Err(e) = self.prefs.clear_auth() {
      tracing::error!(error = %e, "failed to clear stored session");
    }
    tracing::warn!("backend rejected the session; stored credentials cleared");
  }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
  serde_json::to_value(body)
    .map_err(|e| ApiError::request_failed(None, format!("Request failed: {}", e)))
}

/// Decode a successful response. 204 decodes from an empty object.
async fn decode_body<T: DeserializeOwned>(
  status: StatusCode,
  response: Response,
) -> Result<T, ApiError> {
  let invalid = |e: serde_json::Error| {
    ApiError::request_failed(
      Some(status.as_u16()),
      format!("Request failed: invalid response body ({})", e),
    )
  };

  if status == StatusCode::NO_CONTENT {
    return serde_json::from_value(Value::Object(Default::default())).map_err(invalid);
  }

  let bytes = response.bytes().await?;
  serde_json::from_slice(&bytes).map_err(invalid)
}

/// Turn a non-2xx response into `RequestFailed`, preferring the body's message.
async fn error_from_response(response: Response, fallback: impl FnOnce(u16) -> String) -> ApiError {
  let status = response.status().as_u16();
  let text = response.text().await.unwrap_or_default();
  let body = ApiErrorBody::parse(&text);

  let message = body
    .message()
    .map(String::from)
    .unwrap_or_else(|| fallback(status));

  tracing::debug!(status, %message, "api request failed");
  ApiError::request_failed(Some(status), message)
}
