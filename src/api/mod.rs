//! Client for the journal's REST backend.

mod auth;
mod client;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{AuthUser, DataEnvelope};
