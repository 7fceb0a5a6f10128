//! Response envelope types for the MediaWiki `action=query` API.
//!
//! Only the fields the sampler reads are modelled; everything is optional or
//! defaulted so that sparse or unexpected responses degrade to "no results"
//! instead of a decode failure.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level `action=query` response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "Q: Deserialize<'de> + Default"))]
pub struct QueryResponse<Q> {
    /// The `query` object; absent when the server found nothing.
    #[serde(default)]
    pub query: Q,
    /// Present when more results are available.
    #[serde(rename = "continue", default)]
    pub continuation: Option<serde_json::Value>,
}

impl<Q> QueryResponse<Q> {
    /// Whether the server signalled that another page exists.
    #[must_use]
    pub fn has_continuation(&self) -> bool {
        self.continuation.is_some()
    }
}

/// `query` payload for `list=search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

/// A single `list=search` hit.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub title: String,
}

/// `query` payload for `prop=imageinfo`.
#[derive(Debug, Default, Deserialize)]
pub struct PagesQuery {
    /// Keyed by page id (negative ids for missing pages).
    #[serde(default)]
    pub pages: HashMap<String, Page>,
}

/// A page entry in a `prop=imageinfo` response.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub imageinfo: Option<Vec<ImageInfo>>,
}

/// The first revision's image info.
#[derive(Debug, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub extmetadata: Option<HashMap<String, ExtMetadataValue>>,
}

/// One `extmetadata` entry; only `value` is used.
#[derive(Debug, Deserialize)]
pub struct ExtMetadataValue {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl ExtMetadataValue {
    /// Renders the value as text: strings verbatim, null as empty, anything
    /// else as its JSON form.
    #[must_use]
    pub fn as_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
