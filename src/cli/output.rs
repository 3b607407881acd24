//! Plain-text rendering of records and the dashboard.

use chrono::NaiveTime;

use crate::api::AuthUser;
use crate::journal::stats::{Dashboard, Greeting};
use crate::journal::{resolve_media_url, BrewLog, Resource, TeaLeaf, Teaware};
use crate::prefs::{display_tag, Locale};

/// Field/value rows for the `show` commands.
pub trait Describe {
  fn describe(&self, base_url: &str) -> Vec<(&'static str, String)>;
}

fn push<T: ToString>(rows: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<T>) {
  if let Some(value) = value {
    rows.push((name, value.to_string()));
  }
}

impl Describe for TeaLeaf {
  fn describe(&self, base_url: &str) -> Vec<(&'static str, String)> {
    let mut rows = vec![("name", self.name.clone())];
    push(&mut rows, "category", self.category.as_deref().map(display_tag));
    push(&mut rows, "origin", self.brand_origin.as_ref());
    push(&mut rows, "year", self.year);
    push(&mut rows, "in stock", self.in_stock);
    push(&mut rows, "notes", self.tasting_notes.as_ref());
    push(
      &mut rows,
      "cover photo",
      self
        .cover_photo
        .as_ref()
        .map(|m| resolve_media_url(base_url, m.thumbnail_url())),
    );
    rows
  }
}

impl Describe for Teaware {
  fn describe(&self, base_url: &str) -> Vec<(&'static str, String)> {
    let mut rows = vec![("name", self.name.clone())];
    push(&mut rows, "type", self.kind.as_deref().map(display_tag));
    push(&mut rows, "material", self.material.as_ref());
    push(&mut rows, "volume", self.volume_ml.map(|ml| format!("{}ml", ml)));
    push(&mut rows, "status", self.status);
    push(&mut rows, "favorite", self.is_favorite);
    push(
      &mut rows,
      "photo",
      self
        .photo
        .as_ref()
        .map(|m| resolve_media_url(base_url, m.thumbnail_url())),
    );
    rows
  }
}

impl Describe for BrewLog {
  fn describe(&self, base_url: &str) -> Vec<(&'static str, String)> {
    let mut rows = vec![("brewed", self.brewed_at.clone())];
    push(&mut rows, "tea", self.tea.as_ref().map(|t| t.label()));
    if !self.teawares.is_empty() {
      let names: Vec<&str> = self.teawares.iter().map(|t| t.name.as_str()).collect();
      rows.push(("teaware", names.join(", ")));
    }
    push(&mut rows, "water", self.water_temp.map(|t| format!("{}°C", t)));
    push(&mut rows, "water type", self.water_type.as_ref());
    push(&mut rows, "leaf", self.leaf_amount_g.map(|g| format!("{}g", g)));
    push(&mut rows, "steeping", self.steeping_details.as_ref());
    push(&mut rows, "rating", self.rating.map(stars));
    push(&mut rows, "review", self.review.as_ref());
    for photo in &self.photos {
      rows.push(("photo", resolve_media_url(base_url, &photo.url)));
    }
    rows
  }
}

fn stars(rating: u8) -> String {
  let filled = usize::from(rating.min(5));
  format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn user_name(user: &AuthUser) -> &str {
  user.display_name.as_deref().unwrap_or(&user.username)
}

pub fn print_record<R: Resource + Describe>(record: &R, base_url: &str) {
  println!("{}  ({})", record.label(), record.cache_key());
  for (name, value) in record.describe(base_url) {
    println!("  {:<12} {}", name, value);
  }
}

pub fn print_dashboard(
  dashboard: &Dashboard,
  user: Option<&AuthUser>,
  locale: Locale,
  now: NaiveTime,
) {
  let greeting = Greeting::at(now).text(locale);
  match user {
    Some(user) => println!("{}, {}", greeting, user_name(user)),
    None => println!("{}", greeting),
  }

  if let Some(weather) = &dashboard.weather {
    println!(
      "\n{}°C {} [{}]\n{}",
      weather.temp, weather.description, weather.icon, weather.suggestion
    );
  }

  let (streak, owned) = match locale {
    Locale::Ko => ("연속 일수", "보유한 차"),
    Locale::En => ("Day streak", "Teas owned"),
  };
  println!("\n{}: {}   {}: {}", streak, dashboard.streak, owned, dashboard.teas_owned);

  if let Some(quote) = &dashboard.quote {
    println!("\n\"{}\"", quote.text);
    if !quote.theme.is_empty() {
      println!("  - {}", quote.theme);
    }
  }

  if !dashboard.this_week.is_empty() {
    println!("\n{}", if locale == Locale::Ko { "이번 주" } else { "This week" });
    for log in dashboard.this_week.iter().take(5) {
      println!("  {}", log.label());
    }
  }

  if !dashboard.recent.is_empty() {
    println!("\n{}", if locale == Locale::Ko { "최근 기록" } else { "Recent" });
    for log in &dashboard.recent {
      println!("  {}\t{}", log.meta.document_id, log.label());
    }
  }
}
