//! `tea`, `teaware` and `brew` subcommands.

use clap::{Args, Subcommand};
use color_eyre::Result;

use crate::journal::{
  BrewLogDraft, BrewLogPatch, RelationRef, Resource, TeaLeafDraft, TeaLeafPatch, TeawareDraft,
  TeawarePatch, TeawareStatus,
};

use super::{list_records, now_timestamp, remove_record, show_record, Context};

#[derive(Subcommand, Debug)]
pub enum TeaCommand {
  /// List every tea
  List,
  /// Show one tea with its cover photo
  Show { id: String },
  /// Add a tea
  Add {
    name: String,
    #[command(flatten)]
    fields: TeaFields,
  },
  /// Change fields of a tea
  Edit {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[command(flatten)]
    fields: TeaFields,
  },
  /// Delete a tea
  Rm { id: String },
}

#[derive(Args, Debug)]
pub struct TeaFields {
  /// e.g. Oolong, Sheng_Puerh
  #[arg(long)]
  category: Option<String>,
  #[arg(long)]
  brand_origin: Option<String>,
  #[arg(long)]
  year: Option<i32>,
  #[arg(long)]
  in_stock: Option<bool>,
  #[arg(long)]
  notes: Option<String>,
  /// Media id from `chacha upload`
  #[arg(long)]
  cover_photo: Option<u64>,
}

impl TeaFields {
  fn into_draft(self, name: String) -> TeaLeafDraft {
    TeaLeafDraft {
      name,
      category: self.category,
      brand_origin: self.brand_origin,
      year: self.year,
      in_stock: self.in_stock,
      tasting_notes: self.notes,
      cover_photo: self.cover_photo,
    }
  }

  fn into_patch(self, name: Option<String>) -> TeaLeafPatch {
    TeaLeafPatch {
      name,
      category: self.category,
      brand_origin: self.brand_origin,
      year: self.year,
      in_stock: self.in_stock,
      tasting_notes: self.notes,
      cover_photo: self.cover_photo,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum TeawareCommand {
  /// List every piece of teaware
  List,
  /// Show one piece with its photo
  Show { id: String },
  /// Add teaware
  Add {
    name: String,
    #[command(flatten)]
    fields: TeawareFields,
  },
  /// Change fields of a piece of teaware
  Edit {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[command(flatten)]
    fields: TeawareFields,
  },
  /// Delete a piece of teaware
  Rm { id: String },
}

#[derive(Args, Debug)]
pub struct TeawareFields {
  /// e.g. Gaiwan, Yixing_Pot
  #[arg(long = "type")]
  kind: Option<String>,
  #[arg(long)]
  material: Option<String>,
  #[arg(long)]
  volume_ml: Option<i32>,
  #[arg(long, value_enum)]
  status: Option<TeawareStatus>,
  #[arg(long)]
  favorite: Option<bool>,
  /// Media id from `chacha upload`
  #[arg(long)]
  photo: Option<u64>,
}

impl TeawareFields {
  fn into_draft(self, name: String) -> TeawareDraft {
    TeawareDraft {
      name,
      kind: self.kind,
      material: self.material,
      volume_ml: self.volume_ml,
      status: self.status,
      is_favorite: self.favorite,
      photo: self.photo,
    }
  }

  fn into_patch(self, name: Option<String>) -> TeawarePatch {
    TeawarePatch {
      name,
      kind: self.kind,
      material: self.material,
      volume_ml: self.volume_ml,
      status: self.status,
      is_favorite: self.favorite,
      photo: self.photo,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum BrewCommand {
  /// List brew logs, newest first as the server returns them
  List,
  /// Show one brew with its tea, teaware and photos
  Show { id: String },
  /// Log a brew
  Add(BrewFields),
  /// Change fields of a brew log
  Edit {
    id: String,
    #[command(flatten)]
    fields: BrewFields,
  },
  /// Delete a brew log
  Rm { id: String },
}

#[derive(Args, Debug)]
pub struct BrewFields {
  /// When the tea was brewed (defaults to now on add)
  #[arg(long = "at")]
  brewed_at: Option<String>,
  /// Water temperature in °C
  #[arg(long)]
  temp: Option<i32>,
  #[arg(long)]
  water: Option<String>,
  /// Leaf amount in grams
  #[arg(long)]
  grams: Option<f64>,
  #[arg(long)]
  steeping: Option<String>,
  /// 1 to 5
  #[arg(long)]
  rating: Option<u8>,
  #[arg(long)]
  review: Option<String>,
  /// Tea id or document id
  #[arg(long)]
  tea: Option<RelationRef>,
  /// Teaware id or document id; repeatable
  #[arg(long = "teaware")]
  teawares: Vec<RelationRef>,
  /// Media id from `chacha upload`; repeatable
  #[arg(long = "photo")]
  photos: Vec<u64>,
}

impl BrewFields {
  fn into_draft(self) -> BrewLogDraft {
    BrewLogDraft {
      brewed_at: self.brewed_at.unwrap_or_else(now_timestamp),
      water_temp: self.temp,
      water_type: self.water,
      leaf_amount_g: self.grams,
      steeping_details: self.steeping,
      rating: self.rating,
      review: self.review,
      tea: self.tea,
      teawares: self.teawares,
      photos: self.photos,
    }
  }

  fn into_patch(self) -> BrewLogPatch {
    BrewLogPatch {
      brewed_at: self.brewed_at,
      water_temp: self.temp,
      water_type: self.water,
      leaf_amount_g: self.grams,
      steeping_details: self.steeping,
      rating: self.rating,
      review: self.review,
      tea: self.tea,
      teawares: (!self.teawares.is_empty()).then_some(self.teawares),
      photos: (!self.photos.is_empty()).then_some(self.photos),
    }
  }
}

pub async fn run_tea(command: TeaCommand, ctx: &Context) -> Result<()> {
  let teas = &ctx.journal.teas;
  match command {
    TeaCommand::List => list_records(teas).await?,
    TeaCommand::Show { id } => show_record(teas, Some(id), ctx.journal.api.base_url()).await?,
    TeaCommand::Add { name, fields } => {
      let tea = teas.create(fields.into_draft(name)).await?;
      println!("Added {}\t{}", tea.meta.document_id, tea.label());
    }
    TeaCommand::Edit { id, name, fields } => {
      let tea = teas.update(&id, fields.into_patch(name)).await?;
      println!("Updated {}", tea.label());
    }
    TeaCommand::Rm { id } => remove_record(teas, &id).await?,
  }
  Ok(())
}

pub async fn run_teaware(command: TeawareCommand, ctx: &Context) -> Result<()> {
  let teawares = &ctx.journal.teawares;
  match command {
    TeawareCommand::List => list_records(teawares).await?,
    TeawareCommand::Show { id } => {
      show_record(teawares, Some(id), ctx.journal.api.base_url()).await?
    }
    TeawareCommand::Add { name, fields } => {
      let teaware = teawares.create(fields.into_draft(name)).await?;
      println!("Added {}\t{}", teaware.meta.document_id, teaware.label());
    }
    TeawareCommand::Edit { id, name, fields } => {
      let teaware = teawares.update(&id, fields.into_patch(name)).await?;
      println!("Updated {}", teaware.label());
    }
    TeawareCommand::Rm { id } => remove_record(teawares, &id).await?,
  }
  Ok(())
}

pub async fn run_brew(command: BrewCommand, ctx: &Context) -> Result<()> {
  let brew_logs = &ctx.journal.brew_logs;
  match command {
    BrewCommand::List => list_records(brew_logs).await?,
    BrewCommand::Show { id } => {
      show_record(brew_logs, Some(id), ctx.journal.api.base_url()).await?
    }
    BrewCommand::Add(fields) => {
      let log = brew_logs.create(fields.into_draft()).await?;
      println!("Logged {}\t{}", log.meta.document_id, log.brew_date());
    }
    BrewCommand::Edit { id, fields } => {
      brew_logs.update(&id, fields.into_patch()).await?;
      println!("Updated {}", id);
    }
    BrewCommand::Rm { id } => remove_record(brew_logs, &id).await?,
  }
  Ok(())
}
