//! Generic read and write operations over one backend collection.
//!
//! Reads go through the query cache. Writes follow the optimistic protocol in
//! [`crate::cache::mutation`]: the cached list is projected first, the request
//! runs, and the list is rolled back on failure and invalidated either way.
//!
//! Projections work on the raw cached JSON so that a rollback puts back
//! exactly what was there, field for field.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

use crate::api::{ApiClient, ApiError, DataEnvelope};
use crate::cache::mutation::optimistic;
use crate::cache::{QueryCache, QueryKey};
use crate::query::Query;

use super::record::{next_updated_at, RecordMeta};
use super::resource::Resource;

pub struct Collection<R> {
  api: ApiClient,
  cache: QueryCache,
  resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
  fn clone(&self) -> Self {
    Self {
      api: self.api.clone(),
      cache: self.cache.clone(),
      resource: PhantomData,
    }
  }
}

impl<R: Resource> Collection<R> {
  pub fn new(api: ApiClient, cache: QueryCache) -> Self {
    Self {
      api,
      cache,
      resource: PhantomData,
    }
  }

  pub fn list_key() -> QueryKey {
    QueryKey::list(R::COLLECTION)
  }

  pub fn detail_key(document_id: &str) -> QueryKey {
    QueryKey::detail(R::COLLECTION, document_id)
  }

  fn path(document_id: Option<&str>) -> String {
    match document_id {
      Some(id) => format!("/{}/{}", R::COLLECTION, id),
      None => format!("/{}", R::COLLECTION),
    }
  }

  /// Every record, in server order.
  pub async fn list(&self) -> Result<Vec<R>, ApiError> {
    let api = &self.api;
    let path = Self::path(None);
    let result = self
      .cache
      .fetch_query(&Self::list_key(), || async move {
        let envelope: DataEnvelope<Vec<R>> = api.get(&path).await?;
        Ok(envelope.data)
      })
      .await?;

    tracing::debug!(
      entity = R::entity_type(),
      count = result.data.len(),
      source = ?result.source,
      cached_at = ?result.cached_at,
      "listed"
    );
    Ok(result.data)
  }

  /// One record with its relations populated.
  pub async fn get(&self, document_id: &str) -> Result<R, ApiError> {
    let api = &self.api;
    let path = Self::path(Some(document_id));
    let result = self
      .cache
      .fetch_query(&Self::detail_key(document_id), || async move {
        let envelope: DataEnvelope<R> = api.get_with_query(&path, R::POPULATE).await?;
        Ok(envelope.data)
      })
      .await?;
    Ok(result.data)
  }

  /// Cached copy of one listed record, without touching the network.
  pub fn find_cached(&self, document_id: &str) -> Result<Option<R>, ApiError> {
    let list = self
      .cache
      .read::<Vec<R>>(&Self::list_key())?
      .unwrap_or_default();
    Ok(list.into_iter().find(|item| item.cache_key() == document_id))
  }

  pub fn list_query(&self) -> Query<Vec<R>> {
    let collection = self.clone();
    Query::new(move || {
      let collection = collection.clone();
      async move { collection.list().await.map_err(|e| e.to_string()) }
    })
  }

  /// Single-record query; disabled while no record is selected.
  pub fn detail_query(&self, document_id: Option<String>) -> Query<R> {
    let collection = self.clone();
    Query::gated(document_id.is_some(), move || {
      let collection = collection.clone();
      let document_id = document_id.clone();
      async move {
        match document_id {
          Some(id) => collection.get(&id).await.map_err(|e| e.to_string()),
          None => Err("no record selected".to_string()),
        }
      }
    })
  }

  /// Create a record. A placeholder is appended to the cached list until the
  /// server answers.
  pub async fn create(&self, draft: R::Draft) -> Result<R, ApiError> {
    R::validate_draft(&draft)?;

    let mut placeholder = scalar_fields::<R, _>(&draft)?;
    let meta = RecordMeta::placeholder(Utc::now());
    if let Value::Object(meta) = serde_json::to_value(&meta).map_err(ApiError::Cache)? {
      placeholder.extend(meta);
    }

    let path = Self::path(None);
    let body = DataEnvelope { data: draft };
    let created = optimistic(
      &self.cache,
      &Self::list_key(),
      move |old: Option<Vec<Value>>| {
        let mut list = old.unwrap_or_default();
        list.push(Value::Object(placeholder));
        Some(list)
      },
      self.api.post::<DataEnvelope<R>, _>(&path, &body),
    )
    .await?;

    tracing::info!(
      entity = R::entity_type(),
      document_id = created.data.cache_key(),
      "created"
    );
    Ok(created.data)
  }

  /// Update a record. The patch's own fields are merged into the cached entry
  /// straight away; relations wait for the refetch.
  pub async fn update(&self, document_id: &str, patch: R::Patch) -> Result<R, ApiError> {
    R::validate_patch(&patch)?;

    let fields = scalar_fields::<R, _>(&patch)?;
    let target = document_id.to_string();
    let path = Self::path(Some(document_id));
    let body = DataEnvelope { data: patch };
    let updated = optimistic(
      &self.cache,
      &Self::list_key(),
      move |old: Option<Vec<Value>>| {
        old.map(|list| {
          list
            .into_iter()
            .map(|item| {
              if document_id_of(&item) == Some(target.as_str()) {
                merge_fields(item, &fields)
              } else {
                item
              }
            })
            .collect()
        })
      },
      self.api.put::<DataEnvelope<R>, _>(&path, &body),
    )
    .await?;

    tracing::info!(entity = R::entity_type(), document_id, "updated");
    Ok(updated.data)
  }

  pub async fn delete(&self, document_id: &str) -> Result<(), ApiError> {
    let target = document_id.to_string();
    let path = Self::path(Some(document_id));
    optimistic(
      &self.cache,
      &Self::list_key(),
      move |old: Option<Vec<Value>>| {
        old.map(|list| {
          list
            .into_iter()
            .filter(|item| document_id_of(item) != Some(target.as_str()))
            .collect()
        })
      },
      self.api.delete::<Value>(&path),
    )
    .await?;

    tracing::info!(entity = R::entity_type(), document_id, "deleted");
    Ok(())
  }
}

/// Payload fields minus relations, as a JSON object.
fn scalar_fields<R: Resource, B: Serialize>(body: &B) -> Result<Map<String, Value>, ApiError> {
  match serde_json::to_value(body).map_err(ApiError::Cache)? {
    Value::Object(mut fields) => {
      for relation in R::RELATIONS {
        fields.remove(*relation);
      }
      Ok(fields)
    }
    _ => Ok(Map::new()),
  }
}

fn document_id_of(item: &Value) -> Option<&str> {
  item.get("documentId").and_then(Value::as_str)
}

fn merge_fields(mut item: Value, fields: &Map<String, Value>) -> Value {
  if let Value::Object(entry) = &mut item {
    let previous = entry
      .get("updatedAt")
      .and_then(Value::as_str)
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
      .map(|t| t.with_timezone(&Utc))
      .unwrap_or(DateTime::<Utc>::MIN_UTC);

    for (field, value) in fields {
      entry.insert(field.clone(), value.clone());
    }

    let stamp = next_updated_at(previous);
    entry.insert(
      "updatedAt".to_string(),
      Value::String(stamp.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
    );
  }
  item
}
