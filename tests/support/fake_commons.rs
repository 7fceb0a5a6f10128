//! In-process stand-in for the Commons API and upload host.
//!
//! Search and imageinfo responses are computed from the request's own query
//! parameters, so paging offsets and metadata batches behave like the real
//! endpoint without fixing the seeded order in advance.

use std::collections::HashMap;
use std::time::Duration;

use commons_sampler::api::RetryPolicy;
use commons_sampler::{ApiClient, Fetcher, HarvestSettings, Harvester};
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const API_PATH: &str = "/w/api.php";

/// One file known to the fake server.
#[derive(Debug, Clone)]
pub struct FakeFile {
    pub title: String,
    pub url: String,
    pub mime: String,
}

impl FakeFile {
    /// An image served by `server` under `/files/<name>`.
    pub fn image(server: &MockServer, title: &str, name: &str) -> Self {
        Self {
            title: title.to_string(),
            url: format!("{}/files/{name}", server.uri()),
            mime: "image/jpeg".to_string(),
        }
    }
}

fn param(request: &Request, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Pages through a fixed title list using `sroffset`/`srlimit`.
pub struct SearchResponder {
    titles: Vec<String>,
}

impl Respond for SearchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let offset: usize = param(request, "sroffset")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let limit: usize = param(request, "srlimit")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let end = (offset + limit).min(self.titles.len());
        let start = offset.min(end);
        let hits: Vec<Value> = self.titles[start..end]
            .iter()
            .map(|title| json!({ "title": title }))
            .collect();

        let mut body = json!({ "query": { "search": hits } });
        if end < self.titles.len() {
            body["continue"] = json!({ "sroffset": end, "continue": "-||" });
        }
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Resolves the `titles` parameter against known files; unknown titles come
/// back as missing pages.
pub struct ImageInfoResponder {
    files: HashMap<String, FakeFile>,
}

impl Respond for ImageInfoResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let titles = param(request, "titles").unwrap_or_default();
        let mut pages = Map::new();
        for (index, title) in titles.split('|').filter(|t| !t.is_empty()).enumerate() {
            let page = match self.files.get(title) {
                Some(file) => json!({
                    "title": file.title,
                    "imageinfo": [{
                        "url": file.url,
                        "mime": file.mime,
                        "extmetadata": {
                            "LicenseShortName": { "value": "CC BY-SA 4.0" },
                            "Artist": { "value": "Tester" }
                        }
                    }]
                }),
                None => json!({ "title": title, "missing": "" }),
            };
            // Reverse-ordered ids so the mapping order differs from submission.
            pages.insert(format!("{}", 100_000 - index), page);
        }
        ResponseTemplate::new(200).set_body_json(json!({ "query": { "pages": pages } }))
    }
}

/// Serves search results for one query.
pub async fn mount_search(server: &MockServer, query: &str, titles: Vec<String>) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", format!("{query} filetype:bitmap")))
        .respond_with(SearchResponder { titles })
        .mount(server)
        .await;
}

/// Serves imageinfo for `files` and their bytes under `/files/`.
pub async fn mount_files(server: &MockServer, files: &[FakeFile]) {
    let by_title = files
        .iter()
        .map(|file| (file.title.clone(), file.clone()))
        .collect();
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("prop", "imageinfo"))
        .respond_with(ImageInfoResponder { files: by_title })
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/files/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake image bytes".to_vec()))
        .mount(server)
        .await;
}

/// Harvester pointed at `server` with no pacing, no progress output and a
/// single API attempt.
pub fn harvester_for(server: &MockServer, settings: HarvestSettings) -> Harvester {
    let http = reqwest::Client::new();
    let api = ApiClient::new(
        http.clone(),
        &format!("{}{API_PATH}", server.uri()),
        RetryPolicy::new(1, Duration::ZERO, 2.0),
        Duration::from_secs(5),
    )
    .expect("mock endpoint is a valid URL");
    Harvester::new(
        api,
        Fetcher::new(http),
        HarvestSettings {
            pace: Duration::ZERO,
            show_progress: false,
            ..settings
        },
    )
}

/// Parses a manifest written by the harvester into rows of fields.
///
/// Test data never contains commas or quotes, so a plain split is enough.
pub fn read_manifest(path: &std::path::Path) -> Vec<Vec<String>> {
    let raw = std::fs::read_to_string(path).expect("manifest should exist");
    raw.split("\r\n")
        .filter(|line| !line.is_empty())
        .skip(1)
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}
