//! Command-line surface: argument definitions and dispatch.

mod output;
mod records;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::journal::{Collection, Journal, Resource};
use crate::prefs::{display_tag, Locale, Preferences, TagList};
use crate::query::{Query, QueryState};

use output::Describe;
use records::{BrewCommand, TeaCommand, TeawareCommand};

#[derive(Parser, Debug)]
#[command(name = "chacha")]
#[command(about = "A tea journal for the terminal: brews, teas and teaware")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/chacha/config.yaml)
  #[arg(short, long, global = true)]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Sign in and remember the session
  Login {
    /// Username or email
    identifier: String,
    #[arg(long, env = "CHACHA_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Create an account and sign in
  Register {
    username: String,
    email: String,
    #[arg(long, env = "CHACHA_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Forget the session and all cached data
  Logout,
  /// Show the signed-in user
  Whoami,
  /// Streak, this week's brews, quote of the day and weather
  Home,
  /// Tea leaves
  #[command(subcommand)]
  Tea(TeaCommand),
  /// Teapots, cups and other teaware
  #[command(subcommand)]
  Teaware(TeawareCommand),
  /// Brew logs
  #[command(subcommand)]
  Brew(BrewCommand),
  /// Upload a photo and print its media id
  Upload { path: PathBuf },
  /// Local preferences
  #[command(subcommand)]
  Prefs(PrefsCommand),
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
  /// Print every preference
  Show,
  /// Set the display language
  Locale {
    #[arg(value_enum)]
    locale: Locale,
  },
  /// Turn dark mode on or off
  DarkMode {
    #[arg(action = clap::ArgAction::Set)]
    enabled: bool,
  },
  /// Add a tea category or teaware type
  AddTag {
    #[arg(value_enum)]
    list: TagList,
    name: String,
  },
  /// Remove a tea category or teaware type
  RmTag {
    #[arg(value_enum)]
    list: TagList,
    name: String,
  },
}

/// Shared state for one command invocation.
pub struct Context {
  pub config: Config,
  pub prefs: Preferences,
  pub journal: Journal,
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
  let api = &ctx.journal.api;
  match command {
    Command::Login {
      identifier,
      password,
    } => {
      let user = api.login(&identifier, &password).await?;
      println!("Signed in as {}", output::user_name(&user));
    }
    Command::Register {
      username,
      email,
      password,
    } => {
      let user = api.register(&username, &email, &password).await?;
      println!("Welcome, {}", output::user_name(&user));
    }
    Command::Logout => {
      api.logout(&ctx.journal.cache)?;
      println!("Signed out");
    }
    Command::Whoami => match api.current_user().await? {
      Some(user) => println!("{} <{}>", output::user_name(&user), user.email),
      None => println!("Not signed in"),
    },
    Command::Home => home(ctx).await?,
    Command::Tea(command) => records::run_tea(command, ctx).await?,
    Command::Teaware(command) => records::run_teaware(command, ctx).await?,
    Command::Brew(command) => records::run_brew(command, ctx).await?,
    Command::Upload { path } => {
      let media = api.upload_file(&path).await?;
      println!(
        "{}\t{}",
        media.id,
        crate::journal::resolve_media_url(api.base_url(), &media.url)
      );
    }
    Command::Prefs(command) => prefs(command, ctx)?,
  }
  Ok(())
}

async fn home(ctx: &Context) -> Result<()> {
  let locale = ctx.prefs.locale()?;
  let today = Local::now().date_naive();

  let (user, dashboard) = tokio::join!(
    ctx.journal.api.current_user(),
    ctx.journal.dashboard(today, locale),
  );
  let user = user?;
  let dashboard = dashboard?;

  output::print_dashboard(&dashboard, user.as_ref(), locale, Local::now().time());
  Ok(())
}

fn prefs(command: PrefsCommand, ctx: &Context) -> Result<()> {
  let prefs = &ctx.prefs;
  match command {
    PrefsCommand::Show => {
      println!("locale       {}", prefs.locale()?);
      println!(
        "dark mode    {}",
        prefs.dark_mode(ctx.config.theme.is_dark())?
      );
      for (title, list) in [
        ("categories  ", TagList::TeaCategories),
        ("teaware     ", TagList::TeawareTypes),
      ] {
        let tags: Vec<String> = prefs.tags(list)?.iter().map(|t| display_tag(t)).collect();
        println!("{} {}", title, tags.join(", "));
      }
    }
    PrefsCommand::Locale { locale } => {
      prefs.set_locale(locale)?;
      println!("Locale set to {}", locale);
    }
    PrefsCommand::DarkMode { enabled } => {
      prefs.set_dark_mode(enabled)?;
      println!("Dark mode {}", if enabled { "on" } else { "off" });
    }
    PrefsCommand::AddTag { list, name } => {
      let tags = prefs.add_tag(list, &name)?;
      println!("{}", tags.join(", "));
    }
    PrefsCommand::RmTag { list, name } => {
      let tags = prefs.remove_tag(list, &name)?;
      println!("{}", tags.join(", "));
    }
  }
  Ok(())
}

/// Run a query to completion and hand back its data.
async fn resolve<T: Send + 'static>(mut query: Query<T>) -> Result<T> {
  if query.state().is_disabled() {
    return Err(eyre!("No record selected"));
  }
  query.fetch();
  query.wait().await;
  match query.into_state() {
    QueryState::Success(data) => Ok(data),
    QueryState::Error(e) => Err(eyre!(e)),
    QueryState::Disabled => Err(eyre!("No record selected")),
    QueryState::Idle | QueryState::Loading => Err(eyre!("Query did not complete")),
  }
}

async fn list_records<R: Resource + Describe>(collection: &Collection<R>) -> Result<()> {
  let records = resolve(collection.list_query()).await?;
  if records.is_empty() {
    println!("Nothing here yet");
  }
  for record in &records {
    println!("{}\t{}", record.cache_key(), record.label());
  }
  Ok(())
}

async fn show_record<R: Resource + Describe>(
  collection: &Collection<R>,
  document_id: Option<String>,
  base_url: &str,
) -> Result<()> {
  let record = resolve(collection.detail_query(document_id)).await?;
  output::print_record(&record, base_url);
  Ok(())
}

async fn remove_record<R: Resource>(collection: &Collection<R>, document_id: &str) -> Result<()> {
  let label = collection
    .find_cached(document_id)?
    .map(|record| record.label())
    .unwrap_or_else(|| document_id.to_string());

  collection.delete(document_id).await?;
  println!("Deleted {}", label);
  Ok(())
}

/// Default brew timestamp for a log created without one.
fn now_timestamp() -> String {
  Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
