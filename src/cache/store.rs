//! In-memory query cache.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

use crate::api::ApiError;

use super::key::QueryKey;
use super::traits::CacheResult;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
  data: Value,
  written_at: DateTime<Utc>,
  stale: bool,
}

#[derive(Default)]
struct Inner {
  entries: HashMap<QueryKey, Entry>,
  /// Bumped to orphan reads that are still in flight
  generations: HashMap<QueryKey, u64>,
  write_locks: HashMap<QueryKey, Arc<tokio::sync::Mutex<()>>>,
}

/// Captured state of one key, used to undo a speculative write.
#[derive(Debug, Clone)]
pub struct Snapshot {
  key: QueryKey,
  entry: Option<Entry>,
}

/// Proof that a read started at a given generation of its key.
#[derive(Debug)]
pub struct FetchTicket {
  key: QueryKey,
  generation: u64,
}

/// Process-wide cache of query results, keyed by [`QueryKey`].
///
/// Values are stored as JSON so one store can hold every result type. The
/// handle is cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<Inner>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new(Duration::minutes(5))
  }
}

impl QueryCache {
  pub fn new(stale_time: Duration) -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner::default())),
      stale_time,
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current value for `key`, stale or not.
  pub fn read<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, ApiError> {
    self
      .read_entry(key)
      .map(|found| found.map(|(data, _)| data))
  }

  fn read_entry<T: DeserializeOwned>(
    &self,
    key: &QueryKey,
  ) -> Result<Option<(T, DateTime<Utc>)>, ApiError> {
    let entry = self.lock().entries.get(key).cloned();
    match entry {
      Some(entry) => {
        let data = serde_json::from_value(entry.data).map_err(ApiError::Cache)?;
        Ok(Some((data, entry.written_at)))
      }
      None => Ok(None),
    }
  }

  /// Replace the value for `key`. The entry becomes fresh.
  pub fn write<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), ApiError> {
    let data = serde_json::to_value(value).map_err(ApiError::Cache)?;
    self.lock().entries.insert(
      key.clone(),
      Entry {
        data,
        written_at: Utc::now(),
        stale: false,
      },
    );
    Ok(())
  }

  /// Transform the value for `key`.
  ///
  /// The updater sees the current value (if any). Returning `None` leaves the
  /// entry exactly as it was.
  pub fn update<T, F>(&self, key: &QueryKey, updater: F) -> Result<(), ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(Option<T>) -> Option<T>,
  {
    let current = self.read::<T>(key)?;
    match updater(current) {
      Some(next) => self.write(key, &next),
      None => Ok(()),
    }
  }

  /// Mark one entry stale so the next read goes to the network.
  pub fn invalidate(&self, key: &QueryKey) {
    if let Some(entry) = self.lock().entries.get_mut(key) {
      entry.stale = true;
    }
    tracing::debug!(key = %key, "invalidated");
  }

  /// Mark a collection's list and every one of its detail entries stale.
  pub fn invalidate_collection(&self, collection: &str) {
    let mut inner = self.lock();
    for (key, entry) in inner.entries.iter_mut() {
      if key.collection() == Some(collection) {
        entry.stale = true;
      }
    }
    tracing::debug!(collection, "invalidated collection");
  }

  /// Whether the next read of `key` would hit the network.
  pub fn is_stale(&self, key: &QueryKey) -> bool {
    self.is_stale_after(key, self.stale_time)
  }

  fn is_stale_after(&self, key: &QueryKey, stale_time: Duration) -> bool {
    match self.lock().entries.get(key) {
      Some(entry) => entry.stale || Utc::now() - entry.written_at > stale_time,
      None => true,
    }
  }

  pub fn snapshot(&self, key: &QueryKey) -> Snapshot {
    Snapshot {
      key: key.clone(),
      entry: self.lock().entries.get(key).cloned(),
    }
  }

  /// Put a key back exactly as it was when the snapshot was taken, including
  /// being absent.
  pub fn restore(&self, snapshot: Snapshot) {
    let mut inner = self.lock();
    match snapshot.entry {
      Some(entry) => {
        inner.entries.insert(snapshot.key, entry);
      }
      None => {
        inner.entries.remove(&snapshot.key);
      }
    }
  }

  /// Orphan every read of `key` that is still in flight; their results will
  /// not be written.
  pub fn cancel_in_flight(&self, key: &QueryKey) {
    *self.lock().generations.entry(key.clone()).or_default() += 1;
  }

  /// Register the start of a read.
  pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
    let generation = *self.lock().generations.entry(key.clone()).or_default();
    FetchTicket {
      key: key.clone(),
      generation,
    }
  }

  /// Store a read's result unless the read was cancelled meanwhile.
  ///
  /// Returns whether the value was written.
  pub fn finish_fetch<T: Serialize>(&self, ticket: &FetchTicket, value: &T) -> Result<bool, ApiError> {
    let current = self
      .lock()
      .generations
      .get(&ticket.key)
      .copied()
      .unwrap_or_default();
    if current != ticket.generation {
      tracing::debug!(key = %ticket.key, "discarding superseded fetch result");
      return Ok(false);
    }
    self.write(&ticket.key, value)?;
    Ok(true)
  }

  /// Drop every entry and orphan every read in flight.
  pub fn clear(&self) {
    let mut inner = self.lock();
    inner.entries.clear();
    for generation in inner.generations.values_mut() {
      *generation += 1;
    }
    tracing::debug!("query cache cleared");
  }

  /// Lock that serializes writes to `key`.
  pub async fn write_lock(&self, key: &QueryKey) -> OwnedMutexGuard<()> {
    let lock = Arc::clone(self.lock().write_locks.entry(key.clone()).or_default());
    lock.lock_owned().await
  }

  /// Read-through fetch using the cache's default stale time.
  pub async fn fetch_query<T, F, Fut>(
    &self,
    key: &QueryKey,
    fetcher: F,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    self.fetch_query_with(key, self.stale_time, fetcher).await
  }

  /// Read-through fetch.
  ///
  /// 1. Fresh entry: return it
  /// 2. Missing or stale: fetch from network and store the result
  /// 3. If a write cancelled the fetch meanwhile, return what the cache now
  ///    holds instead of the superseded response
  ///
  /// A 401 clears the whole cache: nothing fetched under the old session is
  /// trusted any more.
  pub async fn fetch_query_with<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    if !self.is_stale_after(key, stale_time) {
      if let Some((data, cached_at)) = self.read_entry(key)? {
        return Ok(CacheResult::from_cache(data, cached_at));
      }
    }

    tracing::debug!(key = %key, "fetching");
    let ticket = self.begin_fetch(key);

    let data = match fetcher().await {
      Ok(data) => data,
      Err(e) => {
        if e.is_unauthorized() {
          self.clear();
        }
        return Err(e);
      }
    };

    if self.finish_fetch(&ticket, &data)? {
      return Ok(CacheResult::from_network(data));
    }

    match self.read_entry(key)? {
      Some((cached, cached_at)) => Ok(CacheResult::from_cache(cached, cached_at)),
      None => Ok(CacheResult::from_network(data)),
    }
  }
}
