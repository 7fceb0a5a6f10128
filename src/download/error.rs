//! Failures while fetching one image file.
//!
//! A `DownloadError` is per image: the harvester logs it, leaves the image
//! out of the manifest and carries on with the next one.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, TLS or body-stream failure.
    #[error("could not fetch image {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image fetch timed out: {url}")]
    Timeout { url: String },

    /// Upload server answered with a non-success status.
    #[error("image server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Destination folder or file could not be written.
    #[error("cannot write image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image URL is not absolute: {url}")]
    InvalidUrl { url: String },
}

impl DownloadError {
    /// Wraps a transport error, reporting elapsed deadlines as [`DownloadError::Timeout`].
    pub fn network(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_url(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
        }
    }

    /// True when retrying the same URL later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Io { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}
