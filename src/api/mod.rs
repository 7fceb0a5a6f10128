//! Remote MediaWiki API access.
//!
//! - [`ApiClient`] issues parameterised JSON requests with retry and backoff.
//! - [`RetryPolicy`] holds the attempt budget and delay schedule.
//! - [`types`] models the `action=query` response envelope.

mod client;
mod error;
mod retry;
pub mod types;

pub use client::{ApiClient, DEFAULT_API_TIMEOUT, DEFAULT_API_URL};
pub use error::ApiError;
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryDecision, RetryPolicy};
