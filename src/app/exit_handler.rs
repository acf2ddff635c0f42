//! Exit code logic for the downloader process.
//!
//! Single responsibility: map the run report to the process exit outcome.

use index_downloader::DownloadReport;

use crate::ProcessExit;

/// Determines the process exit outcome from completed and failed download counts.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome for a finished run; skipped files count as completed.
pub(crate) fn exit_outcome_for_report(report: &DownloadReport) -> ProcessExit {
    determine_exit_outcome(report.succeeded() + report.skipped(), report.failed())
}
