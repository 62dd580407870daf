//! Line-buffered relay of local diagnostic output to the host.
//!
//! Writes accumulate until a newline completes a line; each complete,
//! non-empty line becomes exactly one relay call. A trailing partial line is
//! only forwarded by an explicit [`LineRelay::flush`].

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

use super::HostBridge;

/// Assembles whole lines out of arbitrary write fragments.
pub struct LineRelay {
    buffer: Vec<u8>,
    bridge: Arc<HostBridge>,
}

impl LineRelay {
    pub fn new(bridge: Arc<HostBridge>) -> Self {
        Self {
            buffer: Vec::new(),
            bridge,
        }
    }

    /// Append bytes, relaying every line they complete.
    pub fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = &line[..line.len() - 1];
            if text.is_empty() {
                continue;
            }
            let mut owned = String::from_utf8_lossy(text).into_owned();
            owned.push('\n');
            self.forward(&owned);
        }
    }

    /// Relay the trailing partial line, newline appended.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.buffer);
        let mut owned = String::from_utf8_lossy(&pending).into_owned();
        owned.push('\n');
        self.forward(&owned);
    }

    /// Bytes written since the last complete line.
    #[cfg(test)]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    fn forward(&self, line: &str) {
        if let Err(e) = self.bridge.relay_line(line) {
            // Last resort: keep the line visible locally.
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(line.as_bytes());
            let _ = writeln!(stderr, "[bridge] log relay failed: {e}");
        }
    }
}

/// The single writer that feeds a [`LineRelay`].
///
/// Installed as the `tracing-subscriber` writer so every formatted diagnostic
/// passes through the line buffer.
#[derive(Clone)]
pub struct RelayWriter {
    relay: Arc<Mutex<LineRelay>>,
}

impl RelayWriter {
    pub fn new(bridge: Arc<HostBridge>) -> Self {
        Self {
            relay: Arc::new(Mutex::new(LineRelay::new(bridge))),
        }
    }

    /// Forward any trailing partial line. Call at shutdown.
    pub fn flush_pending(&self) {
        self.relay.lock().flush();
    }
}

/// Per-event handle returned by [`RelayWriter::make_writer`].
pub struct RelayGuard {
    relay: Arc<Mutex<LineRelay>>,
}

impl Write for RelayGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.relay.lock().write(buf);
        Ok(buf.len())
    }

    // Partial lines wait for a newline or an explicit `flush_pending`.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RelayWriter {
    type Writer = RelayGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RelayGuard {
            relay: Arc::clone(&self.relay),
        }
    }
}
