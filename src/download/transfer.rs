//! Resumable single-resource transfer with retry.
//!
//! [`transfer`] owns one destination file for the duration of its retry
//! loop. Resume decisions are keyed purely off the file's current length on
//! disk, so a later run against the same directory picks up where an earlier
//! one stopped.
//!
//! Per attempt:
//! - local length 0: plain GET, expect 200.
//! - local length N > 0: GET with `Range: bytes=N-`. A 206 is appended at N;
//!   a 200 means the server ignored the range, so the file is truncated and
//!   rewritten from byte 0.
//! - any other status fails the attempt.
//!
//! After the body ends the file length is compared to the declared remote
//! size (when known). A short file fails the attempt but is left in place so
//! the next attempt resumes from it.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::CONTENT_RANGE;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, trace, warn};

use super::engine::DownloadStats;
use super::error::DownloadError;
use super::handle::ResourceHandle;
use super::retry::{RetryDecision, RetryPolicy};
use super::HttpClient;

/// Progress line interval for resources of unknown size.
const UNKNOWN_SIZE_PROGRESS_STEP: u64 = 8 * 1024 * 1024;

/// Terminal result of one [`transfer`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Destination already matched the declared remote size; no request sent.
    Skipped {
        /// Existing destination path.
        path: PathBuf,
    },

    /// Transfer finished and passed length verification (when possible).
    Succeeded {
        /// Destination path.
        path: PathBuf,
        /// Final file length.
        bytes: u64,
        /// Attempts used, including the successful one.
        attempts: u32,
        /// Whether stale local bytes were discarded at some point
        /// (range ignored by the server, or an oversized partial).
        restarted: bool,
    },

    /// Every attempt failed. Partial bytes, if any, remain on disk.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Display text of the last attempt's error.
        error: String,
    },
}

impl TransferOutcome {
    /// Returns `true` for [`TransferOutcome::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Destination path for skipped or succeeded outcomes.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Skipped { path } | Self::Succeeded { path, .. } => Some(path),
            Self::Failed { .. } => None,
        }
    }
}

/// Downloads one resource, resuming and retrying as needed.
///
/// `remote_size` is the declared length from a size probe. When it is `None`
/// no completeness check is possible and any cleanly finished stream counts
/// as success.
///
/// This never returns an error: attempt failures are retried with backoff
/// and exhaustion is reported as [`TransferOutcome::Failed`].
#[instrument(skip(client, handle, policy, stats), fields(file = %handle.file_name()))]
pub async fn transfer(
    client: &HttpClient,
    handle: &ResourceHandle,
    remote_size: Option<u64>,
    policy: &RetryPolicy,
    stats: &DownloadStats,
) -> TransferOutcome {
    let destination = handle.destination();

    if let Some(expected) = remote_size
        && local_length(destination).await == Some(expected)
    {
        info!(bytes = expected, "already complete, skipping");
        return TransferOutcome::Skipped {
            path: destination.to_path_buf(),
        };
    }

    let mut restarted = false;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!(attempt, max_attempts = policy.max_attempts(), "attempting transfer");

        let error = match attempt_once(client, handle, remote_size, stats, &mut restarted).await {
            Ok(bytes) => {
                info!(bytes, attempts = attempt, restarted, "download complete");
                return TransferOutcome::Succeeded {
                    path: destination.to_path_buf(),
                    bytes,
                    attempts: attempt,
                    restarted,
                };
            }
            Err(error) => error,
        };

        match policy.should_retry(attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next_attempt,
            } => {
                warn!(
                    url = %handle.url(),
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "attempt failed, retrying"
                );
                debug!(next_attempt, "backing off");
                stats.increment_retried();
                tokio::time::sleep(delay).await;
            }
            RetryDecision::DoNotRetry { reason } => {
                warn!(
                    url = %handle.url(),
                    attempts = attempt,
                    %reason,
                    error = %error,
                    "download failed after all attempts"
                );
                return TransferOutcome::Failed {
                    attempts: attempt,
                    error: error.to_string(),
                };
            }
        }
    }
}

/// Runs one GET and streams it to disk. Returns the final file length.
async fn attempt_once(
    client: &HttpClient,
    handle: &ResourceHandle,
    remote_size: Option<u64>,
    stats: &DownloadStats,
    restarted: &mut bool,
) -> Result<u64, DownloadError> {
    let destination = handle.destination();
    let url = handle.url();

    let mut offset = local_length(destination).await.unwrap_or(0);
    if let Some(expected) = remote_size
        && offset > expected
    {
        // A range past the end is unsatisfiable; start over.
        warn!(local = offset, remote = expected, "local file larger than remote, restarting");
        offset = 0;
        *restarted = true;
    }

    let response = client.fetch(url, offset).await?;
    let status = response.status();

    let append = match status {
        StatusCode::PARTIAL_CONTENT => {
            if let Some(start) = content_range_start(&response)
                && start != offset
            {
                return Err(DownloadError::range_mismatch(url.as_str(), offset, start));
            }
            offset > 0
        }
        StatusCode::OK => {
            if offset > 0 {
                warn!(discarded = offset, "server did not honor range, restarting download");
                offset = 0;
                *restarted = true;
            }
            false
        }
        other => return Err(DownloadError::http_status(url.as_str(), other.as_u16())),
    };

    let file = open_destination(destination, append).await?;
    let written = stream_to_file(file, response, handle, offset, remote_size, stats).await?;

    let actual = local_length(destination).await.unwrap_or(0);
    debug!(written, actual, "stream finished");
    if let Some(expected) = remote_size
        && actual != expected
    {
        return Err(DownloadError::incomplete(destination, expected, actual));
    }

    Ok(actual)
}

async fn open_destination(path: &Path, append: bool) -> Result<File, DownloadError> {
    let result = if append {
        OpenOptions::new().create(true).append(true).open(path).await
    } else {
        File::create(path).await
    };
    result.map_err(|e| DownloadError::io(path, e))
}

/// Streams the response body to `file` in receipt order, returning bytes written.
///
/// Each chunk is written as soon as it arrives. Bytes already written stay on
/// disk if the stream fails midway.
async fn stream_to_file(
    mut file: File,
    response: reqwest::Response,
    handle: &ResourceHandle,
    offset: u64,
    remote_size: Option<u64>,
    stats: &DownloadStats,
) -> Result<u64, DownloadError> {
    let path = handle.destination();
    let mut stream = response.bytes_stream();
    let mut progress = ProgressLog::new(remote_size, offset);
    let mut written: u64 = 0;

    let outcome = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::network(handle.url().as_str(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(path, e))?;

            let len = chunk.len() as u64;
            written += len;
            stats.add_bytes(len);

            let downloaded = offset + written;
            trace!(downloaded, total = ?remote_size, "chunk written");
            if progress.advance(downloaded) {
                info!(
                    downloaded,
                    total = ?remote_size,
                    percent = ?progress.percent(downloaded),
                    "downloading"
                );
            }
        }
        Ok::<(), DownloadError>(())
    }
    .await;

    // Flush even on failure: the next attempt resumes from the bytes on disk.
    let flushed = file.flush().await.map_err(|e| DownloadError::io(path, e));
    outcome?;
    flushed?;

    Ok(written)
}

/// Decides when a transfer has made enough progress to report again:
/// every tenth of the declared size, or every
/// [`UNKNOWN_SIZE_PROGRESS_STEP`] bytes when the size is unknown.
#[derive(Debug)]
struct ProgressLog {
    total: Option<u64>,
    next_mark: u64,
}

impl ProgressLog {
    fn new(total: Option<u64>, start: u64) -> Self {
        let mut log = Self {
            total,
            next_mark: 0,
        };
        log.next_mark = log.mark_after(start);
        log
    }

    fn step(&self) -> u64 {
        match self.total {
            Some(total) => (total / 10).max(1),
            None => UNKNOWN_SIZE_PROGRESS_STEP,
        }
    }

    fn mark_after(&self, position: u64) -> u64 {
        let step = self.step();
        (position / step + 1).saturating_mul(step)
    }

    /// Returns `true` when `position` reached the next reporting mark.
    fn advance(&mut self, position: u64) -> bool {
        if position < self.next_mark {
            return false;
        }
        self.next_mark = self.mark_after(position);
        true
    }

    fn percent(&self, position: u64) -> Option<u64> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| position.saturating_mul(100) / total)
    }
}

async fn local_length(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|meta| meta.len())
}

/// Start offset from a `Content-Range: bytes START-END/TOTAL` header.
fn content_range_start(response: &reqwest::Response) -> Option<u64> {
    let value = response.headers().get(CONTENT_RANGE)?.to_str().ok()?;
    parse_content_range_start(value)
}

fn parse_content_range_start(value: &str) -> Option<u64> {
    let range = value.trim().strip_prefix("bytes")?.trim_start();
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}
