//! Error types for the remote API client.

use thiserror::Error;

/// Errors that can occur while calling the remote JSON API.
///
/// Every variant except [`ApiError::InvalidEndpoint`] is retried by
/// [`ApiClient`](super::ApiClient); callers only see them once the attempt
/// budget is exhausted.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error calling {url}: {source}")]
    Network {
        /// The request URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout calling {url}")]
    Timeout {
        /// The request URL.
        url: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} calling {url}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the expected JSON.
    #[error("malformed JSON response from {url}: {source}")]
    Decode {
        /// The request URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured endpoint is not a usable absolute URL.
    #[error("invalid API endpoint: {url}")]
    InvalidEndpoint {
        /// The rejected endpoint string.
        url: String,
    },
}

impl ApiError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>) -> Self {
        Self::InvalidEndpoint { url: url.into() }
    }

    /// Whether the client should spend another attempt on this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidEndpoint { .. })
    }
}
