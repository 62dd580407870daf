//! Error types for the host bridge.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the outbound host channels.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Cannot connect to host at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send {frame} frame over '{channel}': {source}")]
    Send {
        channel: String,
        frame: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {frame} frame: {source}")]
    Encode {
        frame: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport '{transport}' is not supported: {reason}")]
    Unsupported { transport: String, reason: String },
}

/// Errors from the inbound event feed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to read event feed: {0}")]
    Read(#[from] std::io::Error),

    #[error("Malformed event record on line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
