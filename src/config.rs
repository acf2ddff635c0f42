//! Run configuration for discovery and downloads.
//!
//! A [`Config`] is built once (usually from CLI flags), validated, and then
//! passed by reference into each component. Nothing in the library reads
//! process-wide mutable settings.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::download::RetryPolicy;
use crate::user_agent;

/// Default directory-index page scanned for media links.
pub const DEFAULT_INDEX_URL: &str = "https://archive.org/download/sesame-street_202308/";

/// Default output directory (relative to the working directory).
pub const DEFAULT_OUTPUT_DIR: &str = "download";

/// Default number of concurrent transfers.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default maximum attempts per resource (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default per-call network timeout (connect, probe, and each chunk read).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default file-name suffix kept by link discovery.
pub const DEFAULT_SUFFIX: &str = ".ia.mp4";

/// Smallest accepted worker count.
pub const MIN_CONCURRENCY: usize = 1;

/// Largest accepted worker count.
pub const MAX_CONCURRENCY: usize = 100;

const MAX_ATTEMPTS: u32 = 20;
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Index address could not be parsed.
    #[error("invalid index URL {url}: {source}")]
    InvalidIndexUrl {
        /// The rejected address.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Index address uses something other than http/https.
    #[error("unsupported scheme `{scheme}` in index URL {url}")]
    UnsupportedScheme {
        /// The rejected address.
        url: String,
        /// Its scheme.
        scheme: String,
    },

    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency { value: usize },

    #[error("invalid max attempts value {value}: must be between 1 and {MAX_ATTEMPTS}")]
    InvalidMaxAttempts { value: u32 },

    #[error("invalid timeout {secs}s: must be between 1 and {MAX_TIMEOUT_SECS} seconds")]
    InvalidTimeout { secs: u64 },

    /// Suffix filter is empty, which would match every link.
    #[error("file suffix filter must not be empty")]
    EmptySuffix,

    /// User-Agent is empty or not a valid header value.
    #[error("invalid User-Agent value: {value:?}")]
    InvalidUserAgent { value: String },
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory-index page to scan.
    pub index_url: String,
    /// Where downloaded files are written.
    pub output_dir: PathBuf,
    /// Maximum transfers in flight.
    pub concurrency: usize,
    /// Maximum attempts per resource.
    pub max_attempts: u32,
    /// Backoff base; attempt `n` waits `base_delay * 2^(n-1)` after failing.
    pub base_delay: Duration,
    /// Per-call network timeout.
    pub timeout: Duration,
    /// Case-insensitive file-name suffix kept by discovery.
    pub suffix: String,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            timeout: DEFAULT_TIMEOUT,
            suffix: DEFAULT_SUFFIX.to_string(),
            user_agent: user_agent::default_user_agent(),
        }
    }
}

impl Config {
    /// Validates every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index_url()?;

        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(ConfigError::InvalidMaxAttempts {
                value: self.max_attempts,
            });
        }
        let secs = self.timeout.as_secs();
        if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
            return Err(ConfigError::InvalidTimeout { secs });
        }
        if self.suffix.trim().is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        if self.user_agent.trim().is_empty()
            || reqwest::header::HeaderValue::from_str(&self.user_agent).is_err()
        {
            return Err(ConfigError::InvalidUserAgent {
                value: self.user_agent.clone(),
            });
        }

        Ok(())
    }

    /// Parses the index address, accepting only http and https.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidIndexUrl`] or
    /// [`ConfigError::UnsupportedScheme`].
    pub fn index_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.index_url).map_err(|source| ConfigError::InvalidIndexUrl {
            url: self.index_url.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme {
                url: self.index_url.clone(),
                scheme: other.to_string(),
            }),
        }
    }

    /// Builds the retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay)
    }
}
