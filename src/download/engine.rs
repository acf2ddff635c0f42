//! Bounded-concurrency scheduler for resource transfers.
//!
//! The [`DownloadEngine`] runs a size probe followed by [`transfer`] for
//! every planned [`ResourceHandle`], with at most `concurrency` units in
//! flight, and waits until each one has produced a terminal outcome.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use index_downloader::{Config, DownloadEngine, HttpClient, ResourceHandle, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::from_config(&Config::default())?;
//! let urls = vec![url::Url::parse("https://example.com/dl/a.ia.mp4")?];
//! let handles = ResourceHandle::plan(&urls, Path::new("./download"))?;
//! let engine = DownloadEngine::new(4, RetryPolicy::default())?;
//! let report = engine.run(&client, handles).await?;
//! println!("succeeded: {}, failed: {}", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::handle::ResourceHandle;
use super::retry::RetryPolicy;
use super::transfer::{TransferOutcome, transfer};
use super::HttpClient;
use crate::config::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Live counters for a run, updated from concurrent transfer tasks.
///
/// Readable while the run is in progress (e.g. by a progress display).
#[derive(Debug, Default)]
pub struct DownloadStats {
    finished: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    bytes_written: AtomicU64,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources that reached any terminal outcome.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Resources that ended in failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Retry attempts made across all resources.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Body bytes written to disk across all resources.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::SeqCst)
    }

    pub(crate) fn record_outcome(&self, outcome: &TransferOutcome) {
        if outcome.is_failed() {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_bytes(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::SeqCst);
    }
}

/// One resource and how its transfer ended.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// The resource.
    pub handle: ResourceHandle,
    /// Its terminal outcome.
    pub outcome: TransferOutcome,
}

/// Outcomes of a whole run, in submission order.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    entries: Vec<ReportEntry>,
    retried: usize,
    bytes_written: u64,
}

impl DownloadReport {
    /// Every entry, in the order handles were submitted.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Number of resources submitted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Resources transferred successfully during this run.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, TransferOutcome::Succeeded { .. }))
    }

    /// Resources already complete on disk.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TransferOutcome::Skipped { .. }))
    }

    /// Resources that exhausted their attempts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(TransferOutcome::is_failed)
    }

    /// Successful resources whose stale partial bytes were discarded.
    #[must_use]
    pub fn restarted(&self) -> usize {
        self.count(|o| matches!(o, TransferOutcome::Succeeded { restarted: true, .. }))
    }

    /// Retry attempts made during the run.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried
    }

    /// Body bytes written during the run.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn count(&self, predicate: impl Fn(&TransferOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }
}

/// Scheduler running transfers under a fixed worker cap.
///
/// # Concurrency Model
///
/// - Each resource runs in its own Tokio task
/// - A semaphore permit is acquired before spawning, so at most
///   `concurrency` probes/transfers (and open files) exist at once
/// - Permits are released when the task ends, including on panic
/// - A panicked task is recorded as a failed outcome for its resource and
///   never affects sibling tasks
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
    /// Retry policy applied to every resource.
    retry_policy: RetryPolicy,
    /// Live counters shared with running tasks.
    stats: Arc<DownloadStats>,
}

impl DownloadEngine {
    /// Creates an engine with the given worker cap and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use index_downloader::{DownloadEngine, RetryPolicy};
    ///
    /// let engine = DownloadEngine::new(4, RetryPolicy::default()).unwrap();
    /// assert_eq!(engine.concurrency(), 4);
    /// ```
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(concurrency: usize, retry_policy: RetryPolicy) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_attempts = retry_policy.max_attempts(),
            base_delay_ms = retry_policy.base_delay().as_millis(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            retry_policy,
            stats: Arc::new(DownloadStats::new()),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Live counters; clone the `Arc` to observe progress while [`Self::run`] is pending.
    #[must_use]
    pub fn stats(&self) -> Arc<DownloadStats> {
        Arc::clone(&self.stats)
    }

    /// Probes and transfers every handle, at most `concurrency` at a time.
    ///
    /// Returns after every handle has a terminal outcome. Individual
    /// failures (including task panics) are recorded in the report, never
    /// returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip(self, client, handles), fields(count = handles.len()))]
    pub async fn run(
        &self,
        client: &HttpClient,
        handles: Vec<ResourceHandle>,
    ) -> Result<DownloadReport, EngineError> {
        let retried_before = self.stats.retried();
        let bytes_before = self.stats.bytes_written();
        let mut tasks = Vec::with_capacity(handles.len());

        info!(concurrency = self.concurrency, "starting downloads");

        for handle in handles {
            // Blocks while `concurrency` tasks are in flight.
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let client = client.clone();
            let retry_policy = self.retry_policy.clone();
            let stats = Arc::clone(&self.stats);
            let task_handle = handle.clone();

            debug!(file = %handle.file_name(), "dispatching transfer");
            let task = tokio::spawn(async move {
                let _permit = permit;
                let remote_size = client.probe_size(task_handle.url()).await;
                let outcome =
                    transfer(&client, &task_handle, remote_size, &retry_policy, &stats).await;
                stats.record_outcome(&outcome);
                outcome
            });
            tasks.push((handle, task));
        }

        debug!(task_count = tasks.len(), "waiting for transfers to complete");

        let mut entries = Vec::with_capacity(tasks.len());
        for (handle, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(
                        file = %handle.file_name(),
                        error = %join_error,
                        "transfer task panicked"
                    );
                    let outcome = TransferOutcome::Failed {
                        attempts: 0,
                        error: format!("task panic: {join_error}"),
                    };
                    self.stats.record_outcome(&outcome);
                    outcome
                }
            };
            entries.push(ReportEntry { handle, outcome });
        }

        let report = DownloadReport {
            entries,
            retried: self.stats.retried() - retried_before,
            bytes_written: self.stats.bytes_written() - bytes_before,
        };
        info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            total = report.total(),
            "downloads finished"
        );
        Ok(report)
    }
}
