//! Query cache with optimistic-write support.
//!
//! This module provides a backend-agnostic cache that:
//! - Stores query results under logical [`QueryKey`]s
//! - Serves fresh entries and refetches stale or invalidated ones
//! - Snapshots and restores entries around speculative writes
//! - Keeps slow reads from overwriting newer optimistic values

mod key;
pub mod mutation;
mod store;
mod traits;

pub use key::QueryKey;
pub use store::QueryCache;
pub use traits::Cacheable;
