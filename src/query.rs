//! Async query abstraction for data fetching.
//!
//! A `Query<T>` owns a fetcher closure plus the state of its latest run:
//! disabled, idle, loading, success or error. Fetches run on the tokio
//! runtime; `wait` collects the result.
//!
//! # Example
//!
//! ```ignore
//! let mut query = brew_logs.detail_query(selected_id.clone());
//!
//! // No-op while the query is disabled (no id selected)
//! query.fetch();
//!
//! match query.wait().await {
//!     QueryState::Disabled => render_placeholder(),
//!     QueryState::Success(log) => render_log(log),
//!     QueryState::Error(e) => render_error(e),
//!     _ => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query is gated off (e.g. its identifier is missing) and will not run
  Disabled,
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_disabled(&self) -> bool {
    matches!(self, QueryState::Disabled)
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query for data fetching with state management.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  enabled: bool,
}

impl<T: Send + 'static> Query<T> {
  /// Create an enabled query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` starts a run.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      enabled: true,
    }
  }

  /// Create a query that only runs while `enabled` is true.
  ///
  /// A disabled query reports [`QueryState::Disabled`], which is neither
  /// loading nor an error.
  pub fn gated<F, Fut>(enabled: bool, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut query = Self::new(fetcher);
    query.set_enabled(enabled);
    query
  }

  /// Turn the query on or off.
  ///
  /// Disabling abandons a pending fetch: its result is dropped unseen and the
  /// state returns to `Disabled`. Enabling a disabled query makes it `Idle`.
  pub fn set_enabled(&mut self, enabled: bool) {
    if enabled == self.enabled {
      return;
    }
    self.enabled = enabled;
    if enabled {
      self.state = QueryState::Idle;
    } else {
      self.receiver = None;
      self.state = QueryState::Disabled;
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn into_state(self) -> QueryState<T> {
    self.state
  }

  /// Start fetching data if enabled and not already loading.
  pub fn fetch(&mut self) {
    if !self.enabled || self.state.is_loading() {
      return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }

  /// Wait for a pending fetch to finish and return the resulting state.
  ///
  /// Returns immediately when nothing is pending.
  pub async fn wait(&mut self) -> &QueryState<T> {
    let result = match &mut self.receiver {
      Some(rx) => rx
        .recv()
        .await
        .unwrap_or_else(|| Err("Query was cancelled".to_string())),
      None => return &self.state,
    };
    self.receiver = None;
    self.state = match result {
      Ok(data) => QueryState::Success(data),
      Err(error) => QueryState::Error(error),
    };
    &self.state
  }
}

// Query is not Clone because the fetcher is boxed and receiver is owned.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("enabled", &self.enabled)
      .finish_non_exhaustive()
  }
}
