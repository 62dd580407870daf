//! Error types for the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of the chunk combiner.
///
/// Waiting states are not errors; see [`super::Readiness`].
#[derive(Error, Debug)]
pub enum CombineError {
    #[error("failed to iterate folder {dir}: {source}")]
    ListJob {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed timestamp check for {path}: {source}")]
    Timestamp {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("job folder must be named '<stem>.md_chunks', markdown originals only: {dir_name}")]
    JobNaming { dir_name: String },

    #[error("failed to read chunk output {path}: {source}")]
    ReadChunk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write combined output {path}: {source}")]
    WriteCombined {
        path: PathBuf,
        source: std::io::Error,
    },
}
