//! Combine command - evaluate one job directory directly.

use std::path::Path;
use std::process::ExitCode;

use crate::cli::Runtime;
use crate::pipeline::combine_job;

/// Print the job's readiness to stderr, combining it when due.
///
/// Hard failures are reported through the bridge like any other combiner
/// failure and turn into a failing exit code.
pub fn run(runtime: &Runtime, job_dir: &Path) -> ExitCode {
    match combine_job(job_dir) {
        Ok(readiness) => {
            eprintln!("{}: {readiness}", job_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("[combiner] {e}");
            runtime.bridge.report_status(&format!("ChunkCombiner: {e}"));
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
