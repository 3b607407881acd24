mod api;
mod cache;
mod cli;
mod config;
mod journal;
mod logging;
mod prefs;
mod query;

use clap::Parser;
use color_eyre::Result;

use api::ApiClient;
use cache::QueryCache;
use journal::weather::WeatherClient;
use journal::Journal;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = cli::Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let _log_guard = logging::init(&config::Config::log_dir()?)?;
  tracing::debug!(api_url = %config.api_url, "starting");

  let prefs = prefs::Preferences::open()?;
  let api = ApiClient::new(&config.api_url, prefs.clone())?;
  let cache = QueryCache::new(config.stale_time());
  let weather = WeatherClient::new(config.weather.clone())?;

  let ctx = cli::Context {
    journal: Journal::new(api, cache, weather),
    prefs,
    config,
  };

  cli::run(args.command, &ctx).await
}
