//! Construction of the single shared HTTP client.
//!
//! Both the API client and the image fetcher use this client, so every
//! outbound request carries the same identity. Request timeouts are applied
//! per request by the callers; only the connect timeout lives here.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tracing::warn;

use crate::user_agent::build_user_agent;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP client construction failed: {0}")]
    Build(#[from] reqwest::Error),

    #[error("HTTP client construction panicked while reading system proxy settings")]
    Panicked,
}

/// Builds the shared client carrying the process User-Agent.
///
/// # Errors
///
/// Returns [`HttpClientError`] if the TLS backend or proxy configuration
/// cannot be initialised.
pub fn build_http_client(contact: Option<&str>) -> Result<Client, HttpClientError> {
    let user_agent = build_user_agent(contact);

    match try_build_client(&user_agent, false) {
        Err(HttpClientError::Panicked) => {
            // Some sandboxed macOS environments panic when the system proxy
            // settings are queried; retry with environment proxies only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            try_build_client(&user_agent, true)
        }
        other => other,
    }
}

fn try_build_client(user_agent: &str, disable_system_proxy_lookup: bool) -> Result<Client, HttpClientError> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent)
            .gzip(true);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(HttpClientError::from)
    }))
    .map_err(|_| HttpClientError::Panicked)?
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = first_env_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = first_env_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn first_env_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
