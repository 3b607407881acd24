//! Home dashboard figures derived from the brew log list.

use chrono::{Datelike, Duration, NaiveDate, Timelike};
use std::collections::BTreeSet;

use crate::prefs::Locale;

use super::brew_log::BrewLog;
use super::quote::Quote;
use super::weather::Weather;

/// Number of brew logs shown as "recent".
pub const RECENT_COUNT: usize = 3;

fn log_date(log: &BrewLog) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(log.brew_date(), "%Y-%m-%d").ok()
}

/// Consecutive brewing days ending today (or yesterday).
///
/// Dates are walked newest first; each one at most a day before the previous
/// checkpoint extends the streak and the first gap ends it.
pub fn brew_streak(logs: &[BrewLog], today: NaiveDate) -> u32 {
  let dates: BTreeSet<NaiveDate> = logs.iter().filter_map(log_date).collect();

  let mut streak = 0;
  let mut checkpoint = today;
  for date in dates.into_iter().rev() {
    if (checkpoint - date).num_days() > 1 {
      break;
    }
    streak += 1;
    checkpoint = date;
  }
  streak
}

/// Logs brewed in the Monday-starting week that contains `today`.
pub fn brewed_this_week(logs: &[BrewLog], today: NaiveDate) -> Vec<BrewLog> {
  let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
  let sunday = monday + Duration::days(6);
  logs
    .iter()
    .filter(|log| log_date(log).is_some_and(|d| d >= monday && d <= sunday))
    .cloned()
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
  Morning,
  Afternoon,
  Evening,
}

impl Greeting {
  pub fn at(time: impl Timelike) -> Self {
    match time.hour() {
      0..=11 => Greeting::Morning,
      12..=17 => Greeting::Afternoon,
      _ => Greeting::Evening,
    }
  }

  pub fn text(self, locale: Locale) -> &'static str {
    match (self, locale) {
      (Greeting::Morning, Locale::Ko) => "좋은 아침이에요",
      (Greeting::Afternoon, Locale::Ko) => "좋은 오후예요",
      (Greeting::Evening, Locale::Ko) => "좋은 저녁이에요",
      (Greeting::Morning, Locale::En) => "Good Morning",
      (Greeting::Afternoon, Locale::En) => "Good Afternoon",
      (Greeting::Evening, Locale::En) => "Good Evening",
    }
  }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
  pub streak: u32,
  pub teas_owned: usize,
  pub this_week: Vec<BrewLog>,
  pub recent: Vec<BrewLog>,
  pub quote: Option<Quote>,
  pub weather: Option<Weather>,
}

impl Dashboard {
  pub fn build(logs: &[BrewLog], teas_owned: usize, today: NaiveDate) -> Self {
    Self {
      streak: brew_streak(logs, today),
      teas_owned,
      this_week: brewed_this_week(logs, today),
      recent: logs.iter().take(RECENT_COUNT).cloned().collect(),
      quote: None,
      weather: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::journal::record::RecordMeta;
  use chrono::{NaiveTime, Utc};

  fn log(brewed_at: &str) -> BrewLog {
    BrewLog {
      meta: RecordMeta::placeholder(Utc::now()),
      brewed_at: brewed_at.to_string(),
      water_temp: None,
      water_type: None,
      leaf_amount_g: None,
      steeping_details: None,
      rating: None,
      review: None,
      tea: None,
      teawares: vec![],
      photos: vec![],
    }
  }

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn test_streak_counts_consecutive_days() {
    let logs = vec![
      log("2026-05-10T08:00:00.000Z"),
      log("2026-05-10T20:00:00.000Z"),
      log("2026-05-09T08:00:00.000Z"),
      log("2026-05-08T08:00:00.000Z"),
      log("2026-05-05T08:00:00.000Z"),
    ];
    assert_eq!(brew_streak(&logs, day("2026-05-10")), 3);
  }

  #[test]
  fn test_streak_survives_until_tomorrow() {
    let logs = vec![log("2026-05-09"), log("2026-05-08")];
    assert_eq!(brew_streak(&logs, day("2026-05-10")), 2);
    assert_eq!(brew_streak(&logs, day("2026-05-11")), 0);
    assert_eq!(brew_streak(&[], day("2026-05-11")), 0);
  }

  #[test]
  fn test_this_week_starts_monday() {
    // 2026-05-13 is a Wednesday; its week runs 05-11..=05-17.
    let logs = vec![
      log("2026-05-10T23:00:00Z"),
      log("2026-05-11T07:00:00Z"),
      log("2026-05-17T21:00:00Z"),
      log("2026-05-18T07:00:00Z"),
    ];
    let week = brewed_this_week(&logs, day("2026-05-13"));
    let dates: Vec<&str> = week.iter().map(|l| l.brew_date()).collect();
    assert_eq!(dates, vec!["2026-05-11", "2026-05-17"]);
  }

  #[test]
  fn test_dashboard_recent_keeps_server_order() {
    let logs: Vec<BrewLog> = ["2026-01-01", "2026-03-01", "2026-02-01", "2026-04-01"]
      .into_iter()
      .map(log)
      .collect();
    let dashboard = Dashboard::build(&logs, 7, day("2026-04-01"));
    let recent: Vec<&str> = dashboard.recent.iter().map(|l| l.brew_date()).collect();
    assert_eq!(recent, vec!["2026-01-01", "2026-03-01", "2026-02-01"]);
    assert_eq!(dashboard.teas_owned, 7);
    assert_eq!(dashboard.streak, 1);
  }

  #[test]
  fn test_greeting_by_hour() {
    let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
    assert_eq!(Greeting::at(at(6)), Greeting::Morning);
    assert_eq!(Greeting::at(at(12)), Greeting::Afternoon);
    assert_eq!(Greeting::at(at(18)), Greeting::Evening);
    assert_eq!(Greeting::Evening.text(Locale::En), "Good Evening");
  }
}
