//! Tea journal records and the operations on them.
//!
//! Each record type (tea leaf, teaware, brew log) is a [`Resource`] served by
//! a generic [`Collection`]. [`Journal`] bundles the three collections with
//! the shared client and cache, plus the home dashboard helpers.

mod brew_log;
mod collection;
pub mod quote;
mod record;
mod resource;
pub mod stats;
mod tea;
mod teaware;
pub mod weather;

pub use brew_log::{BrewLog, BrewLogDraft, BrewLogPatch};
pub use collection::Collection;
pub use record::{resolve_media_url, RelationRef, ValidationError};
pub use resource::Resource;
pub use tea::{TeaLeaf, TeaLeafDraft, TeaLeafPatch};
pub use teaware::{Teaware, TeawareDraft, TeawarePatch, TeawareStatus};

use chrono::NaiveDate;

use crate::api::{ApiClient, ApiError};
use crate::cache::QueryCache;
use crate::prefs::Locale;

use quote::Quote;
use stats::Dashboard;
use weather::{Weather, WeatherClient};

/// Everything a journal session needs, sharing one client and one cache.
#[derive(Clone)]
pub struct Journal {
  pub api: ApiClient,
  pub cache: QueryCache,
  pub teas: Collection<TeaLeaf>,
  pub teawares: Collection<Teaware>,
  pub brew_logs: Collection<BrewLog>,
  weather: WeatherClient,
}

impl Journal {
  pub fn new(api: ApiClient, cache: QueryCache, weather: WeatherClient) -> Self {
    Self {
      teas: Collection::new(api.clone(), cache.clone()),
      teawares: Collection::new(api.clone(), cache.clone()),
      brew_logs: Collection::new(api.clone(), cache.clone()),
      api,
      cache,
      weather,
    }
  }

  pub async fn daily_quote(&self, today: NaiveDate) -> Result<Option<Quote>, ApiError> {
    let sentences = quote::fetch_sentences(&self.api, &self.cache).await?;
    Ok(quote::pick_quote(&sentences, today))
  }

  pub async fn weather(&self, locale: Locale) -> Result<Option<Weather>, ApiError> {
    self.weather.current(&self.cache, locale).await
  }

  /// Home screen figures. Brew logs and teas are required; the quote and
  /// the weather are decoration and are dropped with a warning on failure.
  pub async fn dashboard(&self, today: NaiveDate, locale: Locale) -> Result<Dashboard, ApiError> {
    let (logs, teas, quote, weather) = futures::join!(
      self.brew_logs.list(),
      self.teas.list(),
      self.daily_quote(today),
      self.weather(locale),
    );

    let mut dashboard = Dashboard::build(&logs?, teas?.len(), today);
    dashboard.quote = quote.unwrap_or_else(|e| {
      tracing::warn!(error = %e, "daily quote unavailable");
      None
    });
    dashboard.weather = weather.unwrap_or_else(|e| {
      tracing::warn!(error = %e, "weather unavailable");
      None
    });
    Ok(dashboard)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::WeatherConfig;
  use crate::prefs::Preferences;
  use httpmock::prelude::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_dashboard_tolerates_missing_quote() {
    let server = MockServer::start_async().await;
    let api = ApiClient::new(&server.base_url(), Preferences::in_memory().unwrap()).unwrap();
    let weather = WeatherClient::new(WeatherConfig::default()).unwrap();
    let journal = Journal::new(api, QueryCache::default(), weather);

    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/brew-logs");
        then.status(200).json_body(json!({ "data": [{
          "id": 1,
          "documentId": "b1",
          "brewed_at": "2026-06-03T08:00:00.000Z",
          "createdAt": "2026-06-03T08:00:00.000Z",
          "updatedAt": "2026-06-03T08:00:00.000Z"
        }] }));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/tea-leaves");
        then.status(200).json_body(json!({ "data": [] }));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/sentences.json");
        then.status(404);
      })
      .await;

    let today = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
    let dashboard = journal.dashboard(today, Locale::En).await.unwrap();

    assert_eq!(dashboard.streak, 1);
    assert_eq!(dashboard.this_week.len(), 1);
    assert_eq!(dashboard.teas_owned, 0);
    assert!(dashboard.quote.is_none());
    assert!(dashboard.weather.is_none());
  }

  #[tokio::test]
  async fn test_dashboard_fails_without_brew_logs() {
    let server = MockServer::start_async().await;
    let api = ApiClient::new(&server.base_url(), Preferences::in_memory().unwrap()).unwrap();
    let weather = WeatherClient::new(WeatherConfig::default()).unwrap();
    let journal = Journal::new(api, QueryCache::default(), weather);

    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/brew-logs");
        then.status(503);
      })
      .await;

    let today = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
    let err = journal.dashboard(today, Locale::Ko).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
  }
}
