use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:1337";
const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Backend base URL, without the `/api` suffix
  #[serde(default = "default_api_url")]
  pub api_url: String,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Dark mode used until the user picks one
  #[serde(default)]
  pub theme: Theme,
  #[serde(default)]
  pub weather: WeatherConfig,
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      cache: CacheConfig::default(),
      theme: Theme::default(),
      weather: WeatherConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached query is refetched
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
}

fn default_stale_secs() -> u64 {
  300
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: default_stale_secs(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn is_dark(self) -> bool {
    self == Theme::Dark
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
  /// OpenWeatherMap key; weather is skipped without one
  pub api_key: Option<String>,
  #[serde(default = "default_latitude")]
  pub latitude: f64,
  #[serde(default = "default_longitude")]
  pub longitude: f64,
  #[serde(default = "default_weather_url")]
  pub base_url: String,
}

// Seoul
fn default_latitude() -> f64 {
  37.5665
}

fn default_longitude() -> f64 {
  126.978
}

fn default_weather_url() -> String {
  DEFAULT_WEATHER_URL.to_string()
}

impl Default for WeatherConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      latitude: default_latitude(),
      longitude: default_longitude(),
      base_url: default_weather_url(),
    }
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./chacha.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/chacha/config.yaml
  ///
  /// Without any file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.with_env_overrides().validated()
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("chacha.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("chacha").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-default config.
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  /// `CHACHA_API_URL` and `CHACHA_WEATHER_API_KEY` win over the file.
  fn with_env_overrides(mut self) -> Self {
    if let Some(url) = env_var("CHACHA_API_URL") {
      self.api_url = url;
    }
    if let Some(key) = env_var("CHACHA_WEATHER_API_KEY") {
      self.weather.api_key = Some(key);
    }
    self
  }

  fn validated(mut self) -> Result<Self> {
    let url = Url::parse(&self.api_url)
      .map_err(|e| eyre!("Invalid api_url {:?}: {}", self.api_url, e))?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(eyre!("api_url must be http or https, got {}", url.scheme()));
    }
    self.api_url = self.api_url.trim_end_matches('/').to_string();
    Ok(self)
  }

  pub fn stale_time(&self) -> chrono::Duration {
    let secs = self.cache.stale_secs.min(u64::from(u32::MAX));
    chrono::Duration::seconds(secs as i64)
  }

  /// Directory for logs and local state.
  pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
      .map(|d| d.join("chacha"))
      .ok_or_else(|| eyre!("Could not determine data directory"))
  }

  pub fn log_dir() -> Result<PathBuf> {
    Ok(Self::data_dir()?.join("logs"))
  }
}

fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
