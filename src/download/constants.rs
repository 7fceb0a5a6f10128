//! Constants for the download module.

use std::time::Duration;

/// Per-request timeout for image downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Write buffer size for streamed bodies (256 KiB).
pub const WRITE_CHUNK_SIZE: usize = 256 * 1024;
