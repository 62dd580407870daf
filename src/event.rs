//! Inbound event records delivered by the host.
//!
//! Wire shape is `{"type": "FileAdded", "path": "/abs/path"}`. The `type` tag is
//! an open set; only [`EventKind::FileAdded`] drives any pipeline stage.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of file-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    FileAdded,
    FileModified,
    FileRemoved,
    /// Any tag this crate does not know about.
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::FileAdded => "FileAdded",
            Self::FileModified => "FileModified",
            Self::FileRemoved => "FileRemoved",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "FileAdded" => Self::FileAdded,
            "FileModified" => Self::FileModified,
            "FileRemoved" => Self::FileRemoved,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub path: PathBuf,
}

impl HostEvent {
    pub fn new(kind: impl Into<EventKind>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
        }
    }

    pub fn file_added(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::FileAdded, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_file_added(&self) -> bool {
        self.kind == EventKind::FileAdded
    }
}
