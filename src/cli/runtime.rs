//! Process wiring shared by the agent commands.

use std::sync::Arc;

use anyhow::anyhow;

use crate::bridge::{self, HostBridge, RelayWriter};
use crate::config::Settings;
use crate::logging;
use crate::pipeline::{Agent, CommandConverter, EventClassifier, ParagraphChunker};

/// Bridge, relay and logging for one process.
pub struct Runtime {
    pub bridge: Arc<HostBridge>,
    relay: RelayWriter,
}

impl Runtime {
    /// Connect the bridge, route logging through the relay, install the crash hook.
    ///
    /// A bridge that cannot connect leaves the process host-blind rather than
    /// failing startup.
    pub fn start(settings: &Settings) -> Self {
        let (bridge, connect_error) = match HostBridge::connect(&settings.bridge) {
            Ok(bridge) => (bridge, None),
            Err(e) => (HostBridge::disconnected(), Some(e)),
        };
        let bridge = Arc::new(bridge);

        let relay = RelayWriter::new(Arc::clone(&bridge));
        logging::init_with_config(&settings.logging, relay.clone());

        if let Some(e) = connect_error {
            tracing::warn!("[bridge] {e}; continuing without host channel");
        }

        bridge::install_crash_hook(Arc::clone(&bridge));

        Self { bridge, relay }
    }

    /// Build an agent with the default collaborators.
    pub fn agent(&self, settings: &Settings) -> anyhow::Result<Agent> {
        settings
            .chunking
            .validate()
            .map_err(|e| anyhow!("invalid [chunking] settings: {e}"))?;

        let classifier = EventClassifier::new(
            Arc::clone(&self.bridge),
            settings.conversion.clone(),
            Box::new(CommandConverter::from_config(&settings.conversion)),
            Box::new(ParagraphChunker::new(settings.chunking.clone())),
        );
        Ok(Agent::new(classifier))
    }

    /// Flush any partial diagnostic line to the host.
    pub fn finish(&self) {
        self.relay.flush_pending();
    }
}
