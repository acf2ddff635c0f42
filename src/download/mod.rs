//! Resumable, concurrent HTTP downloads.
//!
//! This module provides everything after link discovery: the HTTP client,
//! per-resource handles, the retrying transfer engine, and the bounded
//! scheduler that runs transfers side by side.
//!
//! # Features
//!
//! - Streaming downloads (one chunk buffered at a time)
//! - Resume from on-disk partial files via `Range` requests
//! - Fallback to a full rewrite when the server ignores the range
//! - Length verification against the declared `Content-Length`
//! - Exponential backoff between failed attempts
//! - Fixed worker cap across all resources
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use index_downloader::download::{DownloadStats, HttpClient, ResourceHandle, RetryPolicy, transfer};
//! use index_downloader::Config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::from_config(&Config::default())?;
//! let url = url::Url::parse("https://example.com/dl/clip.ia.mp4")?;
//! let handle = ResourceHandle::new(url, Path::new("./download"))?;
//! let size = client.probe_size(handle.url()).await;
//! let outcome = transfer(&client, &handle, size, &RetryPolicy::default(), &DownloadStats::new()).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod handle;
mod retry;
mod transfer;

pub use client::HttpClient;
pub use engine::{DownloadEngine, DownloadReport, DownloadStats, EngineError, ReportEntry};
pub use error::DownloadError;
pub use handle::{PlanError, ResourceHandle, local_file_name};
pub use retry::{RetryDecision, RetryPolicy};
pub use transfer::{TransferOutcome, transfer};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
