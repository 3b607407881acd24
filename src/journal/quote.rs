//! Quote of the day, picked from the sentence list served next to the API.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::cache::{QueryCache, QueryKey};

const SENTENCES_PATH: &str = "sentences.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
  pub id: u64,
  pub text: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub theme_ko: String,
  #[serde(default)]
  pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
  pub text: String,
  pub theme: String,
}

/// Day-of-year (1-based) modulo the list length.
pub fn daily_index(total: usize, date: NaiveDate) -> Option<usize> {
  if total == 0 {
    return None;
  }
  Some(date.ordinal() as usize % total)
}

pub fn pick_quote(sentences: &[Sentence], date: NaiveDate) -> Option<Quote> {
  let sentence = &sentences[daily_index(sentences.len(), date)?];
  Some(Quote {
    text: sentence.text.clone(),
    theme: sentence.theme_ko.clone(),
  })
}

/// The sentence list, refreshed at most once a day.
pub async fn fetch_sentences(api: &ApiClient, cache: &QueryCache) -> Result<Vec<Sentence>, ApiError> {
  let result = cache
    .fetch_query_with(&QueryKey::named("sentences"), Duration::hours(24), || {
      api.get_asset::<Vec<Sentence>>(SENTENCES_PATH)
    })
    .await?;
  Ok(result.data)
}
