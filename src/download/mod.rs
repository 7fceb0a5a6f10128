//! Image download to per-category directories.
//!
//! Naming is deterministic from the category position and title, so a rerun
//! finds files written by an earlier run and skips them without a request.
//!
//! # Example
//!
//! ```no_run
//! use commons_sampler::download::{Fetcher, destination_path};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(commons_sampler::build_http_client(None)?);
//! let dest = destination_path(
//!     Path::new("out/pothole"),
//!     1,
//!     "File:Pothole.jpg",
//!     "https://upload.wikimedia.org/wikipedia/commons/a/ab/Pothole.jpg",
//!     "image/jpeg",
//! );
//! fetcher
//!     .fetch_to_path("https://upload.wikimedia.org/wikipedia/commons/a/ab/Pothole.jpg", &dest)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;

pub use client::{FetchOutcome, Fetcher};
pub use constants::{DOWNLOAD_TIMEOUT, WRITE_CHUNK_SIZE};
pub use error::DownloadError;
pub use filename::{FALLBACK_EXTENSION, MAX_SLUG_LEN, choose_extension, destination_path, slugify};
