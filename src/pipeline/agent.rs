//! Event loop lifecycle around the classifier.

use std::sync::Arc;

use crate::bridge::{self, FeedError, HostBridge};
use crate::event::HostEvent;

use super::classifier::{EventClassifier, Route};

/// Totals for one run of the agent loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub events: usize,
    pub dispatched: usize,
    pub panicked: usize,
    pub malformed: usize,
}

/// One agent: start hook, per-event supervisor, shutdown hook.
pub struct Agent {
    classifier: EventClassifier,
}

impl Agent {
    pub fn new(classifier: EventClassifier) -> Self {
        Self { classifier }
    }

    fn bridge(&self) -> &Arc<HostBridge> {
        self.classifier.bridge()
    }

    pub fn on_start(&self) {
        crate::log_event!(
            "agent",
            "started",
            "host transport: {}",
            self.bridge().transport_name().unwrap_or("none")
        );
    }

    /// Process one event inside a panic boundary.
    ///
    /// Returns `None` when handling panicked; the panic has been reported and
    /// the agent is ready for the next event.
    pub fn on_event(&self, event: &HostEvent) -> Option<Route> {
        match bridge::supervised(|| self.classifier.dispatch(event)) {
            Ok(route) => Some(route),
            Err(payload) => {
                let message = format!(
                    "Event handling panicked for {} ({}): {}",
                    event.path().display(),
                    event.kind,
                    bridge::panic_message(payload.as_ref())
                );
                tracing::error!("[agent] {message}");
                self.bridge().report_status(&message);
                None
            }
        }
    }

    pub fn on_shutdown(&self) {
        crate::log_event!("agent", "shutting down");
    }

    /// Run every event from `events` in order, then the shutdown hook.
    ///
    /// Malformed records are reported and skipped.
    pub fn run<I>(&self, events: I) -> RunStats
    where
        I: IntoIterator<Item = Result<HostEvent, FeedError>>,
    {
        let mut stats = RunStats::default();
        self.on_start();

        for item in events {
            match item {
                Ok(event) => {
                    stats.events += 1;
                    match self.on_event(&event) {
                        Some(Route::Ignore) => {}
                        Some(_) => stats.dispatched += 1,
                        None => stats.panicked += 1,
                    }
                }
                Err(e @ FeedError::Malformed { .. }) => {
                    stats.malformed += 1;
                    tracing::warn!("[agent] {e}");
                    self.bridge().report_status(&format!("Event feed: {e}"));
                }
                Err(e) => {
                    tracing::error!("[agent] {e}");
                    self.bridge().report_status(&format!("Event feed: {e}"));
                }
            }
        }

        self.on_shutdown();
        crate::debug_event!("agent", "run finished", "{stats:?}");
        stats
    }
}
