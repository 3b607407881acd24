//! Current weather and a tea to match it.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey};
use crate::config::WeatherConfig;
use crate::prefs::Locale;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
  /// Rounded, in °C
  pub temp: i32,
  pub description: String,
  /// OpenWeatherMap main group, e.g. `Clouds`
  pub condition: String,
  pub icon: String,
  pub suggestion: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
  weather: Vec<Condition>,
  main: Readings,
}

#[derive(Debug, Deserialize)]
struct Condition {
  main: String,
  #[serde(default)]
  description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
  temp: f64,
}

/// Material icon name for a condition group.
pub fn weather_icon(condition: &str) -> &'static str {
  match condition {
    "Clear" => "wb_sunny",
    "Clouds" => "cloud",
    "Rain" => "umbrella",
    "Drizzle" => "grain",
    "Thunderstorm" => "thunderstorm",
    "Snow" => "ac_unit",
    "Mist" | "Fog" | "Haze" => "blur_on",
    _ => "wb_sunny",
  }
}

/// A tea for the weather. Temperature bands: cold (≤5), chilly (≤15),
/// mild (≤22), warm (≤30), hot.
pub fn tea_suggestion(condition: &str, temp: i32, locale: Locale) -> &'static str {
  let ko = locale == Locale::Ko;
  let pick = |k: &'static str, e: &'static str| if ko { k } else { e };

  match condition {
    "Snow" => pick(
      "눈 내리는 날, 따뜻한 숙보이차로 온기를 채워보세요",
      "A snowy day calls for a warming cup of shou puerh",
    ),
    "Thunderstorm" => pick(
      "천둥 치는 날엔 진한 홍차 한 잔이 마음을 다독여줘요",
      "A strong black tea to settle you through the thunder",
    ),
    "Rain" if temp <= 15 => pick(
      "비 오는 쌀쌀한 날, 깊은 보이차가 잘 어울려요",
      "Cold rain pairs well with a deep puerh",
    ),
    "Rain" => pick(
      "빗소리 들으며 창가에서 우롱차 한 잔 어때요?",
      "How about an oolong by the window, listening to the rain?",
    ),
    "Drizzle" => pick(
      "이슬비 내리는 날, 은은한 백차 한 잔이 어울려요",
      "A gentle white tea suits a drizzly day",
    ),
    "Mist" | "Fog" | "Haze" => pick(
      "안개 낀 고즈넉한 날, 향기로운 차 한 잔이 어울려요",
      "A fragrant tea for a quiet, misty day",
    ),
    "Clouds" if temp <= 10 => pick(
      "흐리고 쌀쌀한 날, 묵직한 홍차로 몸을 녹여보세요",
      "Grey and chilly: warm up with a full-bodied black tea",
    ),
    "Clouds" if temp <= 22 => pick(
      "구름 낀 날엔 부드러운 우롱차가 잘 어울려요",
      "A smooth oolong goes well with a cloudy day",
    ),
    "Clouds" => pick(
      "흐린 날의 여유, 가볍게 녹차 한 잔 어때요?",
      "Take it easy on a cloudy day with a light green tea",
    ),
    _ if temp <= 5 => pick(
      "맑지만 추운 날, 진한 숙보이차로 온기를 채워보세요",
      "Clear but cold: warm up with a rich shou puerh",
    ),
    _ if temp <= 15 => pick(
      "선선한 날씨에 따뜻한 홍차 한 잔 어때요?",
      "How about a hot black tea in this cool weather?",
    ),
    _ if temp <= 22 => pick(
      "차 마시기 딱 좋은 날씨예요, 우롱차 한 잔 어때요?",
      "Perfect tea weather. How about an oolong?",
    ),
    _ if temp <= 30 => pick(
      "따뜻한 오늘, 가볍게 녹차 한 잔 어때요?",
      "A warm day for a light green tea",
    ),
    _ => pick(
      "더운 날엔 시원한 냉차 한 잔이 최고예요",
      "Nothing beats an iced tea on a hot day",
    ),
  }
}

#[derive(Clone)]
pub struct WeatherClient {
  http: reqwest::Client,
  config: WeatherConfig,
}

impl WeatherClient {
  pub fn new(config: WeatherConfig) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("chacha/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { http, config })
  }

  pub fn is_configured(&self) -> bool {
    self.config.api_key.is_some()
  }

  /// Current weather, cached per locale for 30 minutes. `None` when no API
  /// key is set.
  pub async fn current(&self, cache: &QueryCache, locale: Locale) -> Result<Option<Weather>, ApiError> {
    if !self.is_configured() {
      return Ok(None);
    }

    let result = cache
      .fetch_query_with(&weather_key(locale), Duration::minutes(30), || {
        self.fetch(locale)
      })
      .await?;
    Ok(result.data)
  }

  async fn fetch(&self, locale: Locale) -> Result<Option<Weather>, ApiError> {
    let Some(api_key) = self.config.api_key.as_deref() else {
      return Ok(None);
    };

    let url = format!(
      "{}/data/2.5/weather",
      self.config.base_url.trim_end_matches('/')
    );
    let latitude = self.config.latitude.to_string();
    let longitude = self.config.longitude.to_string();

    tracing::debug!(lat = %latitude, lon = %longitude, "fetching weather");

    let response = self
      .http
      .get(url)
      .query(&[
        ("lat", latitude.as_str()),
        ("lon", longitude.as_str()),
        ("appid", api_key),
        ("units", "metric"),
        ("lang", locale.code()),
      ])
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(ApiError::request_failed(
        Some(status.as_u16()),
        "Weather API error",
      ));
    }

    let current: CurrentWeather = response
      .json()
      .await
      .map_err(|e| ApiError::request_failed(None, format!("Weather API error: {}", e)))?;

    Ok(current.into_weather(locale))
  }
}

// Description and suggestion are both localized.
fn weather_key(locale: Locale) -> QueryKey {
  QueryKey::named(match locale {
    Locale::Ko => "weather:ko",
    Locale::En => "weather:en",
  })
}

impl CurrentWeather {
  fn into_weather(self, locale: Locale) -> Option<Weather> {
    let condition = self.weather.into_iter().next()?;
    let temp = self.main.temp.round() as i32;
    Some(Weather {
      temp,
      icon: weather_icon(&condition.main).to_string(),
      suggestion: tea_suggestion(&condition.main, temp, locale).to_string(),
      description: condition.description,
      condition: condition.main,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use httpmock::prelude::*;
  use serde_json::json;

  fn config(server: &MockServer, api_key: Option<&str>) -> WeatherConfig {
    WeatherConfig {
      api_key: api_key.map(String::from),
      latitude: 37.57,
      longitude: 126.98,
      base_url: server.base_url(),
    }
  }

  #[test]
  fn test_suggestion_bands() {
    assert_eq!(
      tea_suggestion("Rain", 12, Locale::Ko),
      "비 오는 쌀쌀한 날, 깊은 보이차가 잘 어울려요"
    );
    assert_eq!(
      tea_suggestion("Clear", 31, Locale::En),
      "Nothing beats an iced tea on a hot day"
    );
    assert_eq!(
      tea_suggestion("Clouds", 22, Locale::En),
      "A smooth oolong goes well with a cloudy day"
    );
    // Unknown groups fall through to the clear-sky bands.
    assert_eq!(
      tea_suggestion("Tornado", 3, Locale::En),
      tea_suggestion("Clear", 3, Locale::En)
    );
  }

  #[test]
  fn test_icons() {
    assert_eq!(weather_icon("Fog"), "blur_on");
    assert_eq!(weather_icon("Smoke"), "wb_sunny");
  }

  #[tokio::test]
  async fn test_no_api_key_means_no_weather() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when.method(GET).path("/data/2.5/weather");
        then.status(200);
      })
      .await;

    let client = WeatherClient::new(config(&server, None)).unwrap();
    let weather = client.current(&QueryCache::default(), Locale::Ko).await.unwrap();

    assert_eq!(weather, None);
    assert_eq!(mock.hits_async().await, 0);
  }

  #[tokio::test]
  async fn test_current_weather_is_cached() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/data/2.5/weather")
          .query_param("appid", "k")
          .query_param("units", "metric")
          .query_param("lang", "en");
        then.status(200).json_body(json!({
          "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds" }],
          "main": { "temp": 8.6 }
        }));
      })
      .await;

    let client = WeatherClient::new(config(&server, Some("k"))).unwrap();
    let cache = QueryCache::default();
    let weather = client.current(&cache, Locale::En).await.unwrap().unwrap();
    client.current(&cache, Locale::En).await.unwrap();

    assert_eq!(weather.temp, 9);
    assert_eq!(weather.icon, "cloud");
    assert_eq!(weather.description, "broken clouds");
    assert_eq!(
      weather.suggestion,
      "Grey and chilly: warm up with a full-bodied black tea"
    );
    assert_eq!(mock.hits_async().await, 1);
  }

  #[tokio::test]
  async fn test_weather_error_is_reported_once() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when.method(GET).path("/data/2.5/weather");
        then.status(401);
      })
      .await;

    let client = WeatherClient::new(config(&server, Some("bad"))).unwrap();
    let err = client
      .current(&QueryCache::default(), Locale::Ko)
      .await
      .unwrap_err();

    assert_eq!(err.to_string(), "Weather API error");
    assert_eq!(mock.hits_async().await, 1);
  }

  #[tokio::test]
  async fn test_locales_are_cached_separately() {
    let server = MockServer::start_async().await;
    let body = |description: &str| {
      json!({
        "weather": [{ "id": 803, "main": "Clouds", "description": description }],
        "main": { "temp": 8.6 }
      })
    };
    let ko = server
      .mock_async(|when, then| {
        when.method(GET).path("/data/2.5/weather").query_param("lang", "ko");
        then.status(200).json_body(body("튼구름"));
      })
      .await;
    let en = server
      .mock_async(|when, then| {
        when.method(GET).path("/data/2.5/weather").query_param("lang", "en");
        then.status(200).json_body(body("broken clouds"));
      })
      .await;

    let client = WeatherClient::new(config(&server, Some("k"))).unwrap();
    let cache = QueryCache::default();
    let korean = client.current(&cache, Locale::Ko).await.unwrap().unwrap();
    let english = client.current(&cache, Locale::En).await.unwrap().unwrap();

    assert_eq!(korean.description, "튼구름");
    assert_eq!(korean.suggestion, tea_suggestion("Clouds", 9, Locale::Ko));
    assert_eq!(english.description, "broken clouds");
    assert_eq!(english.suggestion, tea_suggestion("Clouds", 9, Locale::En));
    assert_eq!(ko.hits_async().await, 1);
    assert_eq!(en.hits_async().await, 1);
  }
}
