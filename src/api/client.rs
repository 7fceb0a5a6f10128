//! Client for the single JSON API endpoint.
//!
//! The [`ApiClient`] issues parameterised GET requests, always forcing
//! `format=json`, and wraps each call in the configured [`RetryPolicy`].

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::ApiError;
use super::retry::{RetryDecision, RetryPolicy};

/// Default Wikimedia Commons API endpoint.
pub const DEFAULT_API_URL: &str = "https://commons.wikimedia.org/w/api.php";

/// Default per-attempt timeout for API calls (30 seconds).
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameter the client owns; callers must not set it.
const FORMAT_PARAM: &str = "format";

/// Client for the remote MediaWiki API.
///
/// Cheap to clone; the underlying [`reqwest::Client`] is shared.
///
/// # Example
///
/// ```no_run
/// use commons_sampler::api::{ApiClient, RetryPolicy, DEFAULT_API_URL, DEFAULT_API_TIMEOUT};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let http = commons_sampler::build_http_client(None)?;
/// let api = ApiClient::new(http, DEFAULT_API_URL, RetryPolicy::default(), DEFAULT_API_TIMEOUT)?;
/// let body: serde_json::Value = api
///     .get_json(&[("action", "query".to_string()), ("meta", "siteinfo".to_string())])
///     .await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Url,
    retry_policy: RetryPolicy,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if `endpoint` is not an absolute
    /// http(s) URL.
    pub fn new(
        client: Client,
        endpoint: &str,
        retry_policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint).map_err(|_| ApiError::invalid_endpoint(endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ApiError::invalid_endpoint(endpoint.as_str()));
        }
        Ok(Self {
            client,
            endpoint,
            retry_policy,
            timeout,
        })
    }

    /// Human-readable page URL for a title on the same wiki.
    ///
    /// `https://commons.wikimedia.org/w/api.php` + `File:Foo bar.jpg` gives
    /// `https://commons.wikimedia.org/wiki/File:Foo_bar.jpg`.
    #[must_use]
    pub fn page_url(&self, title: &str) -> String {
        let root = self
            .endpoint
            .join("/wiki/")
            .map_or_else(|_| "/wiki/".to_string(), String::from);
        format!("{root}{}", title.replace(' ', "_"))
    }

    /// Issues a GET with `params` and decodes the JSON body into `T`.
    ///
    /// Any failure is retried per the [`RetryPolicy`]; a warning is logged on
    /// every retry and the final error is returned once attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last [`ApiError`] seen after the attempt budget is spent.
    #[instrument(skip(self, params), fields(endpoint = %self.endpoint))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.build_url(params);
        let mut attempt = 1;

        loop {
            let error = match self.send_once(&url).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            match self.retry_policy.should_retry(attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        error = %error,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        "API error - retrying in {:.1}s",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, "giving up on API call");
                    return Err(error);
                }
            }
        }
    }

    fn build_url(&self, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                if *key == FORMAT_PARAM {
                    debug!(value = %value, "ignoring caller-supplied format parameter");
                    continue;
                }
                pairs.append_pair(key, value);
            }
            pairs.append_pair(FORMAT_PARAM, "json");
        }
        url
    }

    async fn send_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(url.as_str(), e))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(url.as_str(), e))
    }
}
