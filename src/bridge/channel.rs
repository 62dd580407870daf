//! Transports carrying status reports and relayed log lines to the host.
//!
//! Every frame is one JSON object terminated by a newline:
//!
//! ```text
//! {"kind":"status","message":"Chunk combining failed for ..."}
//! {"kind":"log","line":"12:00:01.337  INFO docpipe: started\n"}
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::BridgeError;

/// One outbound message to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Status { message: String },
    Log { line: String },
}

impl Frame {
    fn label(&self) -> &'static str {
        match self {
            Frame::Status { .. } => "status",
            Frame::Log { .. } => "log",
        }
    }
}

/// A connected outbound transport.
///
/// Calls are fire-and-forget from the caller's point of view: a returned error
/// is only ever logged, never retried.
pub trait HostChannel: Send + Sync {
    /// Transport name for diagnostics.
    fn name(&self) -> &str;

    /// Deliver one status/error message.
    fn send_status(&self, message: &str) -> Result<(), BridgeError>;

    /// Deliver exactly one newline-terminated log line.
    fn send_log_line(&self, line: &str) -> Result<(), BridgeError>;
}

/// Writes JSON frames to any byte stream (stdout, a unix socket, a file).
pub struct StreamChannel<W: Write + Send> {
    name: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamChannel<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    fn write_frame(&self, frame: &Frame) -> Result<(), BridgeError> {
        let label = frame.label();
        let mut encoded = serde_json::to_string(frame).map_err(|source| BridgeError::Encode {
            frame: label,
            source,
        })?;
        encoded.push('\n');

        // Single write + flush under the lock keeps frames from interleaving.
        let mut writer = self.writer.lock();
        writer
            .write_all(encoded.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|source| BridgeError::Send {
                channel: self.name.clone(),
                frame: label,
                source,
            })
    }
}

impl StreamChannel<io::Stdout> {
    /// Frames on the process's standard output.
    pub fn stdout() -> Self {
        Self::new("stdio", io::stdout())
    }
}

#[cfg(unix)]
impl StreamChannel<std::os::unix::net::UnixStream> {
    /// Connect to a unix socket owned by the host.
    ///
    /// The write timeout bounds every call so a stalled host cannot block
    /// event processing indefinitely.
    pub fn unix(
        path: &std::path::Path,
        write_timeout: std::time::Duration,
    ) -> Result<Self, BridgeError> {
        let connect_error = |source| BridgeError::Connect {
            path: path.to_path_buf(),
            source,
        };
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(connect_error)?;
        stream
            .set_write_timeout(Some(write_timeout))
            .map_err(connect_error)?;
        Ok(Self::new(format!("unix:{}", path.display()), stream))
    }
}

impl<W: Write + Send> HostChannel for StreamChannel<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_status(&self, message: &str) -> Result<(), BridgeError> {
        self.write_frame(&Frame::Status {
            message: message.to_string(),
        })
    }

    fn send_log_line(&self, line: &str) -> Result<(), BridgeError> {
        self.write_frame(&Frame::Log {
            line: line.to_string(),
        })
    }
}

/// In-process transport that records every frame.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the bridge.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.frames
            .lock()
            .iter()
            .filter_map(|frame| match frame {
                Frame::Status { message } => Some(message.clone()),
                Frame::Log { .. } => None,
            })
            .collect()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.frames
            .lock()
            .iter()
            .filter_map(|frame| match frame {
                Frame::Log { line } => Some(line.clone()),
                Frame::Status { .. } => None,
            })
            .collect()
    }
}

impl HostChannel for MemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    fn send_status(&self, message: &str) -> Result<(), BridgeError> {
        self.frames.lock().push(Frame::Status {
            message: message.to_string(),
        });
        Ok(())
    }

    fn send_log_line(&self, line: &str) -> Result<(), BridgeError> {
        self.frames.lock().push(Frame::Log {
            line: line.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_channel_writes_one_json_line_per_frame() {
        let channel = StreamChannel::new("buffer", Vec::new());
        channel.send_status("conversion failed").unwrap();
        channel.send_log_line("hello\n").unwrap();

        let written = String::from_utf8(channel.writer.lock().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Frame = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(
            first,
            Frame::Status {
                message: "conversion failed".to_string()
            }
        );
        let second: Frame = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(
            second,
            Frame::Log {
                line: "hello\n".to_string()
            }
        );
    }

    #[test]
    fn test_frame_tag_names() {
        let json = serde_json::to_string(&Frame::Status {
            message: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"status","message":"x"}"#);
    }

    #[test]
    fn test_memory_channel_shares_record_between_clones() {
        let channel = MemoryChannel::new();
        let handle = channel.clone();
        channel.send_status("a").unwrap();
        channel.send_log_line("b\n").unwrap();

        assert_eq!(handle.statuses(), vec!["a".to_string()]);
        assert_eq!(handle.log_lines(), vec!["b\n".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_connect_failure_names_socket() {
        let dir = tempfile::TempDir::new().unwrap();
        let socket = dir.path().join("missing.sock");
        let err = StreamChannel::unix(&socket, std::time::Duration::from_millis(10))
            .err()
            .expect("connect should fail");
        assert!(err.to_string().contains("missing.sock"));
    }
}
