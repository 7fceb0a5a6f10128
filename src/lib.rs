//! Commons Sampler Library
//!
//! Builds small, reproducible image samples from Wikimedia Commons: for each
//! configured category it searches the file namespace, orders the results
//! with a seeded digest, resolves metadata, keeps a capped set of images whose
//! direct URLs were not taken by an earlier category, downloads them into a
//! per-category folder and records provenance in `manifest.csv`.
//!
//! # Architecture
//!
//! - [`api`] - JSON API client with retry and backoff
//! - [`search`] - paginated file-namespace search
//! - [`metadata`] - batched image metadata resolution
//! - [`selector`] - seeded ranking and cross-category de-duplication
//! - [`download`] - destination naming and streaming fetch
//! - [`manifest`] - CSV manifest written once per run
//! - [`harvest`] - the per-category pipeline tying the above together
//! - [`category`] - category table and categories-file parsing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod category;
pub mod config_syntax;
pub mod download;
pub mod harvest;
pub mod http_client;
pub mod manifest;
pub mod metadata;
pub mod search;
pub mod selector;
#[cfg(test)]
pub mod test_support;
pub mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, RetryPolicy};
pub use category::{Category, CategoryError, default_categories, load_categories_file};
pub use download::{DownloadError, FetchOutcome, Fetcher};
pub use harvest::{HarvestError, HarvestReport, HarvestSettings, HarvestState, Harvester};
pub use http_client::{HttpClientError, build_http_client};
pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestError};
pub use metadata::ImageRecord;
pub use selector::{SeenUrls, SelectedImage};
