//! Per-category sampling pipeline.
//!
//! For each category, in table order: search, seeded ranking, metadata for a
//! bounded prefix of the ranking, cross-category de-duplication, then
//! sequential downloads. Everything runs on one task; the only waits are
//! retry backoff, network I/O and the fixed pause after each image.
//!
//! A download failure only drops that image. An API failure that survives
//! its retries aborts the run before the manifest is written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::category::Category;
use crate::download::{FetchOutcome, Fetcher, destination_path};
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, ManifestError};
use crate::metadata::{DEFAULT_BATCH_SIZE, fetch_image_records};
use crate::search::{DEFAULT_SEARCH_LIMIT, search_file_titles};
use crate::selector::{
    DEFAULT_METADATA_POOL, DEFAULT_PER_CATEGORY, SeenUrls, SelectedImage, rank_titles,
    select_unique,
};

/// Default seed for the ranking digest.
pub const DEFAULT_SEED: &str = "venturai";

/// Default pause after each processed image.
pub const DEFAULT_PACE: Duration = Duration::from_millis(250);

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// An API call failed after exhausting its retries.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The manifest could not be written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// An output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarvestError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Images kept per category.
    pub per_category: usize,
    /// Seed mixed into the ranking digest.
    pub seed: String,
    /// Pause after every processed image, whatever its outcome.
    pub pace: Duration,
    /// Search results collected per category.
    pub search_limit: usize,
    /// Ranked titles resolved to metadata per category.
    pub metadata_pool: usize,
    /// Titles per metadata call.
    pub metadata_batch_size: usize,
    /// Print progress lines to stdout.
    pub show_progress: bool,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            per_category: DEFAULT_PER_CATEGORY,
            seed: DEFAULT_SEED.to_string(),
            pace: DEFAULT_PACE,
            search_limit: DEFAULT_SEARCH_LIMIT,
            metadata_pool: DEFAULT_METADATA_POOL,
            metadata_batch_size: DEFAULT_BATCH_SIZE,
            show_progress: true,
        }
    }
}

/// Mutable state threaded through the category loop.
#[derive(Debug, Default)]
pub struct HarvestState {
    /// Direct URLs already selected by earlier categories.
    pub seen: SeenUrls,
    /// Rows accumulated so far.
    pub manifest: Manifest,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Output root the category folders were written under.
    pub out_root: PathBuf,
    /// Path of the written manifest.
    pub manifest_path: PathBuf,
    /// Rows written to the manifest.
    pub manifest_rows: usize,
    /// Images fetched during this run.
    pub downloaded: usize,
    /// Images already on disk.
    pub skipped_existing: usize,
    /// Images whose download failed.
    pub failed: usize,
    /// Categories that selected nothing, in table order.
    pub empty_categories: Vec<String>,
    /// Selected image count per category, in table order.
    pub selected: Vec<(String, usize)>,
}

impl HarvestReport {
    fn new(out_root: &Path) -> Self {
        Self {
            out_root: out_root.to_path_buf(),
            manifest_path: out_root.join(MANIFEST_FILE_NAME),
            manifest_rows: 0,
            downloaded: 0,
            skipped_existing: 0,
            failed: 0,
            empty_categories: Vec::new(),
            selected: Vec::new(),
        }
    }
}

/// Drives the whole pipeline for a list of categories.
#[derive(Debug, Clone)]
pub struct Harvester {
    api: ApiClient,
    fetcher: Fetcher,
    settings: HarvestSettings,
}

impl Harvester {
    #[must_use]
    pub fn new(api: ApiClient, fetcher: Fetcher, settings: HarvestSettings) -> Self {
        Self {
            api,
            fetcher,
            settings,
        }
    }

    /// Processes every category in order, then writes the manifest once.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] if an API call exhausts its retries, the
    /// output directories cannot be created, or the manifest cannot be
    /// written. Individual download failures are not errors.
    #[instrument(skip(self, categories), fields(categories = categories.len(), out_root = %out_root.display()))]
    pub async fn run(&self, categories: &[Category], out_root: &Path) -> Result<HarvestReport, HarvestError> {
        tokio::fs::create_dir_all(out_root)
            .await
            .map_err(|e| HarvestError::io(out_root, e))?;

        let mut state = HarvestState::default();
        let mut report = HarvestReport::new(out_root);

        for category in categories {
            self.harvest_category(category, out_root, &mut state, &mut report)
                .await?;
        }

        state.manifest.write_csv(&report.manifest_path)?;
        report.manifest_rows = state.manifest.len();

        info!(
            rows = report.manifest_rows,
            downloaded = report.downloaded,
            skipped_existing = report.skipped_existing,
            failed = report.failed,
            unique_urls = state.seen.len(),
            "harvest complete"
        );
        for (category, rows) in state.manifest.counts_by_category() {
            debug!(%category, rows, "manifest rows");
        }
        Ok(report)
    }

    #[instrument(skip_all, fields(category = %category.key()))]
    async fn harvest_category(
        &self,
        category: &Category,
        out_root: &Path,
        state: &mut HarvestState,
        report: &mut HarvestReport,
    ) -> Result<(), HarvestError> {
        let key = category.key();
        self.progress(&format!("\n== {key} :: '{}' ==", category.query()));

        let titles = search_file_titles(&self.api, category.query(), self.settings.search_limit).await?;
        let ranked = rank_titles(&self.settings.seed, key, &titles);
        let pool = &ranked[..ranked.len().min(self.settings.metadata_pool)];
        debug!(found = titles.len(), pool = pool.len(), "ranked search results");

        let records =
            fetch_image_records(&self.api, pool, self.settings.metadata_batch_size).await?;
        let candidates = records.len();
        let chosen = select_unique(records, &mut state.seen, key, self.settings.per_category);

        self.progress(&format!(
            "Found {candidates} candidate images; selected {}",
            chosen.len()
        ));
        report.selected.push((key.to_string(), chosen.len()));

        if chosen.is_empty() {
            warn!(category = %key, "No images selected (query too narrow?)");
            report.empty_categories.push(key.to_string());
            return Ok(());
        }

        let category_dir = out_root.join(key);
        tokio::fs::create_dir_all(&category_dir)
            .await
            .map_err(|e| HarvestError::io(&category_dir, e))?;

        let total = chosen.len();
        for (position, image) in chosen.into_iter().enumerate() {
            self.process_image(image, &category_dir, position + 1, total, state, report)
                .await;
            if !self.settings.pace.is_zero() {
                tokio::time::sleep(self.settings.pace).await;
            }
        }

        Ok(())
    }

    async fn process_image(
        &self,
        image: SelectedImage,
        category_dir: &Path,
        index: usize,
        total: usize,
        state: &mut HarvestState,
        report: &mut HarvestReport,
    ) {
        let record = image.record();
        let dest = destination_path(category_dir, index, &record.title, &record.file_url, &record.mime);
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            self.progress(&format!("skip exists: {name}"));
        } else {
            self.progress(&format!("downloading {index:02}/{total} -> {name}"));
        }

        let outcome = self.fetcher.fetch_to_path(&record.file_url, &dest).await;
        match outcome {
            Ok(FetchOutcome::Downloaded { bytes }) => {
                debug!(%name, bytes, "downloaded");
                report.downloaded += 1;
                state.manifest.push(image);
            }
            Ok(FetchOutcome::AlreadyPresent) => {
                report.skipped_existing += 1;
                state.manifest.push(image);
            }
            Err(error) => {
                warn!(
                    url = %record.file_url,
                    error = %error,
                    transient = error.is_transient(),
                    "download failed"
                );
                report.failed += 1;
            }
        }
    }

    fn progress(&self, line: &str) {
        if self.settings.show_progress {
            println!("{line}");
        }
    }
}
