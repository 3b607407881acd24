//! Session management: login, registration and the current user.

use crate::cache::QueryCache;
use crate::prefs::USER_KEY;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{AuthUser, LoginRequest, LoginResponse, RegisterRequest};

impl ApiClient {
  /// Exchange credentials for a token and remember the session.
  pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthUser, ApiError> {
    let response: LoginResponse = self
      .post_public(
        "/auth/local",
        &LoginRequest {
          identifier,
          password,
        },
        "Login failed",
      )
      .await?;

    self.store_session(response)
  }

  /// Create an account and remember the resulting session.
  pub async fn register(
    &self,
    username: &str,
    email: &str,
    password: &str,
  ) -> Result<AuthUser, ApiError> {
    let response: LoginResponse = self
      .post_public(
        "/auth/local/register",
        &RegisterRequest {
          username,
          email,
          password,
        },
        "Registration failed",
      )
      .await?;

    self.store_session(response)
  }

  fn store_session(&self, response: LoginResponse) -> Result<AuthUser, ApiError> {
    self.prefs().set_token(&response.jwt)?;
    self.prefs().set_json(USER_KEY, &response.user)?;
    tracing::info!(user = %response.user.username, "session stored");
    Ok(response.user)
  }

  /// The signed-in user, or `None` when there is no session.
  ///
  /// A stored profile is returned as-is. With only a token on hand the profile
  /// is fetched from `/users/me`; if that fails the whole session is dropped.
  pub async fn current_user(&self) -> Result<Option<AuthUser>, ApiError> {
    if self.prefs().token()?.is_none() {
      return Ok(None);
    }

    // A profile that no longer decodes is refetched rather than trusted.
    if let Ok(Some(user)) = self.prefs().get_json::<AuthUser>(USER_KEY) {
      return Ok(Some(user));
    }

    match self.get::<AuthUser>("/users/me").await {
      Ok(user) => {
        self.prefs().set_json(USER_KEY, &user)?;
        Ok(Some(user))
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not restore session");
        self.prefs().clear_auth()?;
        Ok(None)
      }
    }
  }

  /// Forget the session and everything cached on its behalf.
  pub fn logout(&self, cache: &QueryCache) -> Result<(), ApiError> {
    self.prefs().clear_auth()?;
    cache.clear();
    tracing::info!("logged out");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::QueryKey;
  use crate::prefs::Preferences;
  use httpmock::prelude::*;
  use serde_json::json;

  fn user_json() -> serde_json::Value {
    json!({ "id": 1, "username": "mina", "email": "mina@example.com" })
  }

  #[tokio::test]
  async fn test_login_stores_session() {
    let server = MockServer::start_async().await;
    let prefs = Preferences::in_memory().unwrap();
    let api = ApiClient::new(&server.base_url(), prefs.clone()).unwrap();

    let mock = server
      .mock_async(|when, then| {
        when
          .method(POST)
          .path("/api/auth/local")
          .json_body(json!({ "identifier": "mina", "password": "pw" }));
        then
          .status(200)
          .json_body(json!({ "jwt": "token-1", "user": user_json() }));
      })
      .await;

    let user = api.login("mina", "pw").await.unwrap();

    mock.assert_async().await;
    assert_eq!(user.username, "mina");
    assert_eq!(prefs.token().unwrap().as_deref(), Some("token-1"));
    assert_eq!(prefs.get_json::<AuthUser>(USER_KEY).unwrap(), Some(user));
  }

  #[tokio::test]
  async fn test_login_failure_message() {
    let server = MockServer::start_async().await;
    let prefs = Preferences::in_memory().unwrap();
    let api = ApiClient::new(&server.base_url(), prefs.clone()).unwrap();

    server
      .mock_async(|when, then| {
        when.method(POST).path("/api/auth/local");
        then.status(400).body("");
      })
      .await;

    let err = api.login("mina", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert_eq!(prefs.token().unwrap(), None);
  }

  #[tokio::test]
  async fn test_register_posts_account() {
    let server = MockServer::start_async().await;
    let prefs = Preferences::in_memory().unwrap();
    let api = ApiClient::new(&server.base_url(), prefs.clone()).unwrap();

    server
      .mock_async(|when, then| {
        when
          .method(POST)
          .path("/api/auth/local/register")
          .json_body(json!({ "username": "mina", "email": "mina@example.com", "password": "pw" }));
        then
          .status(200)
          .json_body(json!({ "jwt": "token-2", "user": user_json() }));
      })
      .await;

    api.register("mina", "mina@example.com", "pw").await.unwrap();
    assert_eq!(prefs.token().unwrap().as_deref(), Some("token-2"));
  }

  #[tokio::test]
  async fn test_current_user_fetches_profile_once() {
    let server = MockServer::start_async().await;
    let prefs = Preferences::in_memory().unwrap();
    prefs.set_token("token-1").unwrap();
    let api = ApiClient::new(&server.base_url(), prefs.clone()).unwrap();

    let me = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/users/me");
        then.status(200).json_body(user_json());
      })
      .await;

    let first = api.current_user().await.unwrap();
    let second = api.current_user().await.unwrap();

    assert_eq!(first.as_ref().map(|u| u.id), Some(1));
    assert_eq!(first, second);
    assert_eq!(me.hits_async().await, 1);
  }

  #[tokio::test]
  async fn test_current_user_failure_drops_session() {
    let server = MockServer::start_async().await;
    let prefs = Preferences::in_memory().unwrap();
    prefs.set_token("token-1").unwrap();
    let api = ApiClient::new(&server.base_url(), prefs.clone()).unwrap();

    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/users/me");
        then.status(500);
      })
      .await;

    assert_eq!(api.current_user().await.unwrap(), None);
    assert_eq!(prefs.token().unwrap(), None);
  }

  #[tokio::test]
  async fn test_logout_clears_cache_and_session() {
    let prefs = Preferences::in_memory().unwrap();
    prefs.set_token("token-1").unwrap();
    let api = ApiClient::new("http://localhost:1", prefs.clone()).unwrap();
    let cache = QueryCache::default();
    cache.write(&QueryKey::list("tea-leaves"), &vec![1, 2]).unwrap();

    api.logout(&cache).unwrap();

    assert_eq!(prefs.token().unwrap(), None);
    assert!(cache.read::<Vec<i32>>(&QueryKey::list("tea-leaves")).unwrap().is_none());
  }
}
