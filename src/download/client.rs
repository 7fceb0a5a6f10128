//! Streaming fetch of a single image to a fixed destination.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{DOWNLOAD_TIMEOUT, WRITE_CHUNK_SIZE};
use super::error::DownloadError;

/// Result of a successful [`Fetcher::fetch_to_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was downloaded; carries the number of bytes written.
    Downloaded {
        /// Bytes written to disk.
        bytes: u64,
    },
    /// A file already existed at the destination; nothing was requested.
    AlreadyPresent,
}

/// Downloads images to disk, one at a time.
///
/// The existence check is the only idempotence guard: a file left behind by
/// an externally killed run is treated as complete.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with the default 60 second request timeout.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_timeout(client, DOWNLOAD_TIMEOUT)
    }

    /// Creates a fetcher with an explicit request timeout.
    #[must_use]
    pub fn with_timeout(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Ensures `dest`'s parent exists and, unless `dest` already exists,
    /// streams `url` into it.
    ///
    /// A partial file from a failed transfer is removed before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the URL is invalid, the request fails or
    /// returns a non-success status, or the file cannot be written.
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch_to_path(&self, url: &str, dest: &Path) -> Result<FetchOutcome, DownloadError> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        if tokio::fs::try_exists(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?
        {
            debug!("destination exists, skipping request");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        match stream_to_file(file, response, url, dest).await {
            Ok(bytes) => {
                debug!(bytes, "download complete");
                Ok(FetchOutcome::Downloaded { bytes })
            }
            Err(error) => {
                debug!("cleaning up partial file after error");
                let _ = tokio::fs::remove_file(dest).await;
                Err(error)
            }
        }
    }
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    Ok(bytes_written)
}
