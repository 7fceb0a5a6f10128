//! Seeded ordering and cross-category de-duplication.
//!
//! Candidates are ranked by `SHA-256(seed + "::" + category + "::" + title)`,
//! which gives a sample that varies with the seed but is identical for
//! identical inputs regardless of network response order. Selection then
//! walks the resolved records in that order, skipping any direct URL already
//! taken by an earlier category.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::metadata::ImageRecord;

/// Default number of ranked titles resolved per category.
pub const DEFAULT_METADATA_POOL: usize = 200;

/// Default number of images kept per category.
pub const DEFAULT_PER_CATEGORY: usize = 10;

/// Separator between the parts of the ranking key.
const KEY_SEPARATOR: &str = "::";

/// Ranking digest for one title.
#[must_use]
pub fn ranking_digest(seed: &str, category_key: &str, title: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(category_key.as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(title.as_bytes());
    hasher.finalize().into()
}

/// Orders `titles` ascending by their ranking digest.
#[must_use]
pub fn rank_titles(seed: &str, category_key: &str, titles: &[String]) -> Vec<String> {
    let mut ranked = titles.to_vec();
    ranked.sort_by_cached_key(|title| ranking_digest(seed, category_key, title));
    ranked
}

/// Every direct URL selected so far in this run.
///
/// Grows monotonically; owned by the run driver and passed explicitly.
#[derive(Debug, Default)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`; returns `false` if it was already taken.
    pub fn claim(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// An [`ImageRecord`] bound to the category that selected it.
///
/// The category is fixed at construction and cannot be reassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    category: String,
    record: ImageRecord,
}

impl SelectedImage {
    fn new(category: &str, record: ImageRecord) -> Self {
        Self {
            category: category.to_string(),
            record,
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn record(&self) -> &ImageRecord {
        &self.record
    }
}

/// Takes records in order, skipping URLs already in `seen`, until `cap`
/// records are accepted or the candidates run out.
///
/// Accepted URLs are claimed in `seen` immediately, so a URL repeated within
/// the same candidate list is also taken only once.
#[instrument(skip(records, seen), fields(candidates = records.len(), seen = seen.len()))]
pub fn select_unique(
    records: Vec<ImageRecord>,
    seen: &mut SeenUrls,
    category_key: &str,
    cap: usize,
) -> Vec<SelectedImage> {
    let mut chosen = Vec::with_capacity(cap.min(records.len()));
    for record in records {
        if chosen.len() >= cap {
            break;
        }
        if !seen.claim(&record.file_url) {
            debug!(url = %record.file_url, "skipping URL selected earlier in this run");
            continue;
        }
        chosen.push(SelectedImage::new(category_key, record));
    }
    chosen
}
