//! Optimistic write protocol.
//!
//! Every write to a cached query goes through the same four phases:
//! 1. cancel reads of the key that are still in flight
//! 2. snapshot the current value
//! 3. apply the optimistic projection
//! 4. reconcile: restore the snapshot on failure, then invalidate either way
//!
//! Writes to the same key hold a per-key lock for the whole sequence, so a
//! rollback can never clobber another write's optimistic value.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use crate::api::ApiError;

use super::key::QueryKey;
use super::store::QueryCache;

/// Run `request` with an optimistic projection of `key` applied meanwhile.
///
/// `project` receives the current cached value and returns the speculative
/// one; returning `None` leaves the entry untouched. The request's result is
/// passed through unchanged.
pub async fn optimistic<T, R, P, Fut>(
  cache: &QueryCache,
  key: &QueryKey,
  project: P,
  request: Fut,
) -> Result<R, ApiError>
where
  T: Serialize + DeserializeOwned,
  P: FnOnce(Option<T>) -> Option<T>,
  Fut: Future<Output = Result<R, ApiError>>,
{
  let _guard = cache.write_lock(key).await;

  cache.cancel_in_flight(key);
  let snapshot = cache.snapshot(key);

  if let Err(e) = cache.update(key, project) {
    cache.restore(snapshot);
    return Err(e);
  }

  let result = request.await;

  if let Err(e) = &result {
    if e.is_unauthorized() {
      // The session is gone; nothing cached under it is trusted.
      cache.clear();
    } else {
      tracing::warn!(key = %key, status = ?e.status(), error = %e, "write failed, rolling back");
      cache.restore(snapshot);
    }
  }

  settle(cache, key);
  result
}

fn settle(cache: &QueryCache, key: &QueryKey) {
  match key.collection() {
    Some(collection) => cache.invalidate_collection(collection),
    None => cache.invalidate(key),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{json, Value};

  fn key() -> QueryKey {
    QueryKey::list("brew-logs")
  }

  fn failure() -> ApiError {
    ApiError::RequestFailed {
      status: Some(500),
      message: "boom".to_string(),
    }
  }

  #[tokio::test]
  async fn test_success_keeps_projection_and_invalidates() {
    let cache = QueryCache::default();
    cache.write(&key(), &vec![1, 2]).unwrap();

    let result = optimistic(
      &cache,
      &key(),
      |old: Option<Vec<i32>>| {
        old.map(|mut v| {
          v.push(3);
          v
        })
      },
      async { Ok("done") },
    )
    .await
    .unwrap();

    assert_eq!(result, "done");
    assert_eq!(cache.read::<Vec<i32>>(&key()).unwrap(), Some(vec![1, 2, 3]));
    assert!(cache.is_stale(&key()));
  }

  #[tokio::test]
  async fn test_failure_restores_exact_snapshot() {
    let cache = QueryCache::default();
    let original = json!([{ "documentId": "a", "name": "X", "rating": null }]);
    cache.write(&key(), &original).unwrap();

    let err = optimistic(
      &cache,
      &key(),
      |_old: Option<Value>| Some(json!([])),
      async { Err::<(), _>(failure()) },
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), Some(500));
    let after = cache.read::<Value>(&key()).unwrap().unwrap();
    assert_eq!(
      serde_json::to_vec(&after).unwrap(),
      serde_json::to_vec(&original).unwrap()
    );
    assert!(cache.is_stale(&key()));
  }

  #[tokio::test]
  async fn test_failure_on_empty_cache_leaves_it_empty() {
    let cache = QueryCache::default();

    let _ = optimistic(
      &cache,
      &key(),
      |old: Option<Vec<i32>>| Some(old.unwrap_or_default().into_iter().chain([7]).collect()),
      async { Err::<(), _>(failure()) },
    )
    .await;

    assert_eq!(cache.read::<Vec<i32>>(&key()).unwrap(), None);
  }

  #[tokio::test]
  async fn test_unauthorized_clears_everything() {
    let cache = QueryCache::default();
    cache.write(&key(), &vec![1]).unwrap();
    cache.write(&QueryKey::list("teawares"), &vec![2]).unwrap();

    let err = optimistic(
      &cache,
      &key(),
      |_old: Option<Vec<i32>>| Some(vec![]),
      async { Err::<(), _>(ApiError::Unauthorized) },
    )
    .await
    .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(cache.read::<Vec<i32>>(&key()).unwrap(), None);
    assert_eq!(cache.read::<Vec<i32>>(&QueryKey::list("teawares")).unwrap(), None);
  }

  #[tokio::test]
  async fn test_cancels_reads_in_flight() {
    let cache = QueryCache::default();
    let ticket = cache.begin_fetch(&key());

    optimistic(
      &cache,
      &key(),
      |_old: Option<Vec<i32>>| Some(vec![5]),
      async { Ok(()) },
    )
    .await
    .unwrap();

    assert!(!cache.finish_fetch(&ticket, &vec![0]).unwrap());
    assert_eq!(cache.read::<Vec<i32>>(&key()).unwrap(), Some(vec![5]));
  }

  #[tokio::test]
  async fn test_overlapping_writes_roll_back_in_order() {
    let cache = QueryCache::default();
    cache.write(&key(), &vec![1, 2, 3]).unwrap();

    // First delete fails slowly, second succeeds; the second waits for the
    // first to settle, so the rollback never erases its projection.
    let slow = {
      let cache = cache.clone();
      tokio::spawn(async move {
        optimistic(
          &cache,
          &QueryKey::list("brew-logs"),
          |old: Option<Vec<i32>>| old.map(|v| v.into_iter().filter(|x| *x != 1).collect()),
          async {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            Err::<(), _>(failure())
          },
        )
        .await
      })
    };
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    optimistic(
      &cache,
      &key(),
      |old: Option<Vec<i32>>| old.map(|v| v.into_iter().filter(|x| *x != 2).collect()),
      async { Ok(()) },
    )
    .await
    .unwrap();

    assert!(slow.await.unwrap().is_err());
    assert_eq!(cache.read::<Vec<i32>>(&key()).unwrap(), Some(vec![1, 3]));
  }
}
