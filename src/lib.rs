//! Index Downloader Library
//!
//! This library discovers downloadable media files listed on a remote
//! directory-index page and fetches them to local storage. Interrupted
//! transfers are resumed with byte-range requests, failed attempts are
//! retried with exponential backoff, and several files are downloaded
//! concurrently under a fixed worker cap.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Immutable run configuration and validation
//! - [`discovery`] - Index fetching, tolerant link scanning and filtering
//! - [`download`] - HTTP client, transfer engine and bounded scheduler

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod discovery;
pub mod download;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{
    Config, ConfigError, DEFAULT_BASE_DELAY, DEFAULT_CONCURRENCY, DEFAULT_INDEX_URL,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_DIR, DEFAULT_SUFFIX, DEFAULT_TIMEOUT, MAX_CONCURRENCY,
    MIN_CONCURRENCY,
};
pub use discovery::{DiscoveryError, TagScanner, discover, extract_links};
pub use download::{
    DownloadEngine, DownloadError, DownloadReport, DownloadStats, EngineError, HttpClient,
    PlanError, ReportEntry, ResourceHandle, RetryDecision, RetryPolicy, TransferOutcome,
    local_file_name, transfer,
};
