//! Host bridge: the narrow channel between this process and its supervisor.
//!
//! # Architecture
//!
//! ```text
//!            host process
//!      ^          ^            |
//!   status     log lines    event records
//!      |          |            v
//! HostBridge   LineRelay    EventFeed
//!      ^          ^            |
//!   failures   tracing      Agent loop
//! ```
//!
//! The bridge carries no pipeline logic. It is built once in `main` and handed
//! to the components that need it.

mod channel;
mod crash;
mod error;
mod feed;
mod relay;

use std::io::Write;

use crate::config::{BridgeConfig, Transport};

pub use channel::{Frame, HostChannel, MemoryChannel, StreamChannel};
pub use crash::{
    UNHANDLED_ERROR_PREFIX, UNHANDLED_PANIC_PREFIX, install_crash_hook, panic_message,
    report_unhandled_error, supervised,
};
pub use error::{BridgeError, FeedError};
pub use feed::EventFeed;
pub use relay::{LineRelay, RelayGuard, RelayWriter};

/// Outbound half of the host bridge.
///
/// When no transport could be established the bridge runs host-blind: status
/// reports are dropped with a local warning and log lines go to stderr.
pub struct HostBridge {
    channel: Option<Box<dyn HostChannel>>,
}

impl HostBridge {
    /// Open the transport named in the configuration.
    ///
    /// `Transport::None` yields a disconnected bridge without error.
    pub fn connect(config: &BridgeConfig) -> Result<Self, BridgeError> {
        match config.transport {
            Transport::None => Ok(Self::disconnected()),
            Transport::Stdio => Ok(Self::with_channel(StreamChannel::stdout())),
            Transport::Unix => Self::connect_unix(config),
        }
    }

    #[cfg(unix)]
    fn connect_unix(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let path = config
            .socket_path
            .as_deref()
            .ok_or_else(|| BridgeError::Unsupported {
                transport: "unix".to_string(),
                reason: "bridge.socket_path is not set".to_string(),
            })?;
        let channel = StreamChannel::unix(path, config.write_timeout())?;
        Ok(Self::with_channel(channel))
    }

    #[cfg(not(unix))]
    fn connect_unix(_config: &BridgeConfig) -> Result<Self, BridgeError> {
        Err(BridgeError::Unsupported {
            transport: "unix".to_string(),
            reason: "unix sockets are not available on this platform".to_string(),
        })
    }

    pub fn with_channel(channel: impl HostChannel + 'static) -> Self {
        Self {
            channel: Some(Box::new(channel)),
        }
    }

    pub fn disconnected() -> Self {
        Self { channel: None }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Name of the active transport, if any.
    pub fn transport_name(&self) -> Option<&str> {
        self.channel.as_deref().map(|c| c.name())
    }

    /// Send a status/error message to the host. Never fails.
    pub fn report_status(&self, message: &str) {
        match &self.channel {
            Some(channel) => {
                if let Err(e) = channel.send_status(message) {
                    tracing::error!("[bridge] status report failed: {e}");
                }
            }
            None => {
                tracing::warn!("[bridge] status channel unavailable, report dropped: {message}");
            }
        }
    }

    /// Forward one complete line to the host's log surface.
    ///
    /// Must not log through `tracing`: the relay calls this while holding its
    /// buffer lock.
    pub fn relay_line(&self, line: &str) -> Result<(), BridgeError> {
        match &self.channel {
            Some(channel) => channel.send_log_line(line),
            None => std::io::stderr()
                .write_all(line.as_bytes())
                .map_err(|source| BridgeError::Send {
                    channel: "stderr".to_string(),
                    frame: "log",
                    source,
                }),
        }
    }
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("transport", &self.transport_name())
            .finish()
    }
}
