//! One complete run: discover, plan, download, summarize.

use std::fs;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use index_downloader::{
    DownloadEngine, DownloadReport, HttpClient, ResourceHandle, TransferOutcome, discover,
};
use tracing::{debug, info, warn};

use super::{exit_handler, progress_manager, terminal};
use crate::ProcessExit;
use crate::cli::Args;

pub(crate) async fn run_downloader(args: Args) -> Result<ProcessExit> {
    let config = args.to_config();
    config.validate().context("invalid configuration")?;
    let index_url = config.index_url()?;
    debug!(?config, "configuration resolved");

    let client = HttpClient::from_config(&config)?;

    let links = discover(&client, &index_url, &config.suffix).await?;
    for link in &links {
        info!(url = %link, "discovered");
    }

    if links.is_empty() {
        info!(index = %index_url, suffix = %config.suffix, "no matching files found");
        return Ok(ProcessExit::Success);
    }

    let handles = ResourceHandle::plan(&links, &config.output_dir)?;

    if args.dry_run {
        print_dry_run(&handles);
        return Ok(ProcessExit::Success);
    }

    if !config.output_dir.exists() {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("failed to create output directory {}", config.output_dir.display())
        })?;
        info!(dir = %config.output_dir.display(), "created output directory");
    }

    let engine = DownloadEngine::new(config.concurrency, config.retry_policy())?;
    let total = handles.len();
    let (spinner, stop) = progress_manager::spawn_progress_ui(
        terminal::spinner_enabled(args.quiet),
        engine.stats(),
        total,
    );

    let report = engine.run(&client, handles).await;

    stop.store(true, Ordering::SeqCst);
    if let Some(spinner) = spinner {
        let _ = spinner.await;
    }

    let report = report?;
    log_failures(&report);
    info!(
        total = report.total(),
        succeeded = report.succeeded(),
        skipped = report.skipped(),
        failed = report.failed(),
        restarted = report.restarted(),
        retried = report.retried(),
        bytes = report.bytes_written(),
        "all tasks completed"
    );

    Ok(exit_handler::exit_outcome_for_report(&report))
}

fn print_dry_run(handles: &[ResourceHandle]) {
    for handle in handles {
        println!("{}\t{}", handle.file_name(), handle.url());
    }
}

fn log_failures(report: &DownloadReport) {
    for entry in report.entries() {
        if let TransferOutcome::Failed { attempts, error } = &entry.outcome {
            warn!(
                file = %entry.handle.file_name(),
                url = %entry.handle.url(),
                attempts,
                error = %error,
                "not downloaded"
            );
        }
    }
}
