//! Batched image metadata resolution.
//!
//! Titles are resolved `prop=imageinfo` in fixed-size batches. Anything that is
//! not a `File:` page with an `image/*` MIME type and a direct URL is dropped
//! silently: those are resolution gaps, not errors.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::api::types::{PagesQuery, QueryResponse};
use crate::api::{ApiClient, ApiError};

/// Default number of titles resolved per API call.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Title prefix of the file namespace.
pub const FILE_TITLE_PREFIX: &str = "File:";

/// MIME prefix every accepted record must carry.
pub const IMAGE_MIME_PREFIX: &str = "image/";

const LICENSE_SHORT_NAME: &str = "LicenseShortName";
const LICENSE_URL: &str = "LicenseUrl";
const ARTIST: &str = "Artist";
const CREDIT: &str = "Credit";

/// One image resolved from the API, before it is assigned to a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Page title, e.g. `File:Pothole.jpg`.
    pub title: String,
    /// Direct download URL of the binary content.
    pub file_url: String,
    /// Human-readable description page.
    pub page_url: String,
    pub mime: String,
    pub license_short: String,
    pub license_url: String,
    pub artist: String,
    pub credit: String,
}

/// Resolves `titles` into image records, `batch_size` titles per call.
///
/// Cross-batch order follows `titles`. Within a batch the server's id-keyed
/// mapping is put back into submission order; titles the server normalised
/// to something else follow, sorted by title.
///
/// # Errors
///
/// Propagates an [`ApiError`] once the client's retries are exhausted.
#[instrument(skip(api, titles), fields(titles = titles.len()))]
pub async fn fetch_image_records(
    api: &ApiClient,
    titles: &[String],
    batch_size: usize,
) -> Result<Vec<ImageRecord>, ApiError> {
    let mut records = Vec::with_capacity(titles.len());

    for chunk in titles.chunks(batch_size.max(1)) {
        let response: QueryResponse<PagesQuery> = api
            .get_json(&[
                ("action", "query".to_string()),
                ("prop", "imageinfo".to_string()),
                ("titles", chunk.join("|")),
                ("iiprop", "url|mime|extmetadata".to_string()),
            ])
            .await?;

        let before = records.len();
        records.extend(records_from_pages(api, response.query, chunk));
        debug!(
            requested = chunk.len(),
            accepted = records.len() - before,
            "resolved metadata batch"
        );
    }

    Ok(records)
}

fn records_from_pages(api: &ApiClient, query: PagesQuery, chunk: &[String]) -> Vec<ImageRecord> {
    let position: HashMap<&str, usize> = chunk
        .iter()
        .enumerate()
        .map(|(index, title)| (title.as_str(), index))
        .collect();

    let mut ordered: Vec<(usize, ImageRecord)> = query
        .pages
        .into_values()
        .filter_map(|page| {
            if !page.title.starts_with(FILE_TITLE_PREFIX) {
                debug!(title = %page.title, "skipping non-file page");
                return None;
            }
            let info = page.imageinfo?.into_iter().next()?;
            let mime = info.mime.unwrap_or_default();
            if !mime.starts_with(IMAGE_MIME_PREFIX) {
                debug!(title = %page.title, %mime, "skipping non-image file");
                return None;
            }
            let file_url = info.url.filter(|url| !url.is_empty())?;

            let extmetadata = info.extmetadata.unwrap_or_default();
            let field = |key: &str| {
                extmetadata
                    .get(key)
                    .map(crate::api::types::ExtMetadataValue::as_text)
                    .unwrap_or_default()
            };

            let index = position
                .get(page.title.as_str())
                .copied()
                .unwrap_or(usize::MAX);
            Some((
                index,
                ImageRecord {
                    page_url: api.page_url(&page.title),
                    file_url,
                    mime,
                    license_short: field(LICENSE_SHORT_NAME),
                    license_url: field(LICENSE_URL),
                    artist: field(ARTIST),
                    credit: field(CREDIT),
                    title: page.title,
                },
            ))
        })
        .collect();

    ordered.sort_by(|(a_index, a), (b_index, b)| {
        a_index.cmp(b_index).then_with(|| a.title.cmp(&b.title))
    });
    ordered.into_iter().map(|(_, record)| record).collect()
}
