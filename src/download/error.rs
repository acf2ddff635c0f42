//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so that retry warnings
//! and final failure lines identify the resource without extra context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a single transfer attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read exceeded the per-call timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Response status other than the accepted full/partial content codes.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A partial-content response started at a different offset than requested.
    #[error("range mismatch for {url}: requested offset {expected_offset}, server sent {actual_offset}")]
    RangeMismatch {
        /// The URL being resumed.
        url: String,
        /// Offset sent in the Range header.
        expected_offset: u64,
        /// Start offset reported by Content-Range.
        actual_offset: u64,
    },

    /// Stream ended cleanly but the file length differs from the declared size.
    #[error("incomplete download for {path}: got {actual_bytes} of {expected_bytes} bytes")]
    Incomplete {
        /// Destination that failed verification.
        path: PathBuf,
        /// Declared remote size in bytes.
        expected_bytes: u64,
        /// Bytes present on disk.
        actual_bytes: u64,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a range mismatch error.
    pub fn range_mismatch(url: impl Into<String>, expected_offset: u64, actual_offset: u64) -> Self {
        Self::RangeMismatch {
            url: url.into(),
            expected_offset,
            actual_offset,
        }
    }

    /// Creates an incomplete-transfer error.
    pub fn incomplete(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Incomplete {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path the source error lacks, so callers use the constructors above.
