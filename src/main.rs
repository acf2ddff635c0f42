//! CLI entry point for the index downloader.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

mod app;
mod cli;

use cli::Args;

/// Process-level result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Nothing failed.
    Success,
    /// Some files failed, at least one completed.
    Partial,
    /// Every file failed, or the run aborted before downloading.
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    app::terminal::init_tracing(app::terminal::resolve_default_log_level(
        args.quiet,
        args.verbose,
    ));
    debug!(?args, "CLI arguments parsed");

    let exit = match app::runtime::run_downloader(args).await {
        Ok(exit) => exit,
        Err(err) => {
            error!("run aborted: {err:#}");
            ProcessExit::Failure
        }
    };

    ExitCode::from(exit.code())
}
