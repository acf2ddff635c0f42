//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use index_downloader::{
    Config, DEFAULT_BASE_DELAY, DEFAULT_CONCURRENCY, DEFAULT_INDEX_URL, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_OUTPUT_DIR, DEFAULT_SUFFIX, DEFAULT_TIMEOUT, MAX_CONCURRENCY, MIN_CONCURRENCY,
};

/// Download every media file listed on a directory-index page.
///
/// Interrupted files are resumed on the next run, failed transfers are
/// retried with exponential backoff, and several files download at once.
#[derive(Parser, Debug)]
#[command(name = "index-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Directory-index page to scan for links
    #[arg(default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// Directory downloaded files are written to (created if missing)
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(MIN_CONCURRENCY as i64..=MAX_CONCURRENCY as i64))]
    pub concurrency: u8,

    /// Maximum attempts per file, including the first (1-20)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=20))]
    pub max_attempts: u8,

    /// Base backoff delay in milliseconds; attempt n waits base * 2^(n-1)
    #[arg(short = 'b', long, default_value_t = DEFAULT_BASE_DELAY.as_millis() as u64, value_parser = clap::value_parser!(u64).range(0..=600_000))]
    pub backoff_ms: u64,

    /// Network timeout in seconds for connects, size probes and each read (1-3600)
    #[arg(short = 't', long = "timeout", default_value_t = DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Case-insensitive suffix a link must end with to be downloaded
    #[arg(short = 's', long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Override the User-Agent header
    #[arg(long)]
    pub user_agent: Option<String>,

    /// List discovered files and exit without downloading
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Builds the run configuration from parsed flags.
    pub fn to_config(&self) -> Config {
        let mut config = Config {
            index_url: self.index_url.clone(),
            output_dir: self.output_dir.clone(),
            concurrency: usize::from(self.concurrency),
            max_attempts: u32::from(self.max_attempts),
            base_delay: Duration::from_millis(self.backoff_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            suffix: self.suffix.clone(),
            ..Config::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent.clone_from(user_agent);
        }
        config
    }
}
