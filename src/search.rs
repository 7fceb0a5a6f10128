//! Paginated search of the file namespace.

use tracing::{debug, instrument};

use crate::api::types::{QueryResponse, SearchQuery};
use crate::api::{ApiClient, ApiError};

/// MediaWiki namespace id for `File:` pages.
pub const FILE_NAMESPACE: u32 = 6;

/// Largest page the search endpoint is asked for in one call.
pub const SEARCH_PAGE_SIZE: usize = 50;

/// Default cap on identifiers collected per category.
pub const DEFAULT_SEARCH_LIMIT: usize = 300;

/// Searches `File:` pages matching `query`, restricted to bitmap images.
///
/// Pages through results 50 at a time, clamping the last request to the
/// remaining need, and stops when `limit` titles are collected, a page comes
/// back empty, or the server stops offering a continuation. Never returns
/// more than `limit` titles.
///
/// # Errors
///
/// Propagates an [`ApiError`] once the client's retries are exhausted.
#[instrument(skip(api), fields(query = %query))]
pub async fn search_file_titles(
    api: &ApiClient,
    query: &str,
    limit: usize,
) -> Result<Vec<String>, ApiError> {
    let mut titles: Vec<String> = Vec::new();
    let mut offset = 0usize;
    let search_text = format!("{query} filetype:bitmap");

    while titles.len() < limit {
        let page_size = SEARCH_PAGE_SIZE.min(limit - titles.len());
        let response: QueryResponse<SearchQuery> = api
            .get_json(&[
                ("action", "query".to_string()),
                ("list", "search".to_string()),
                ("srsearch", search_text.clone()),
                ("srnamespace", FILE_NAMESPACE.to_string()),
                ("srlimit", page_size.to_string()),
                ("sroffset", offset.to_string()),
            ])
            .await?;

        let has_more = response.has_continuation();
        let batch: Vec<String> = response
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .take(page_size)
            .collect();
        if batch.is_empty() {
            break;
        }

        offset += batch.len();
        debug!(returned = batch.len(), offset, "search page");
        titles.extend(batch);

        if !has_more {
            break;
        }
    }

    Ok(titles)
}
