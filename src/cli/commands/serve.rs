//! Serve command - host-fed event loop over stdin.

use std::io;

use crate::bridge::EventFeed;
use crate::cli::Runtime;
use crate::config::Settings;

/// Process event records from stdin until EOF.
pub fn run(runtime: &Runtime, settings: &Settings) -> anyhow::Result<()> {
    let agent = runtime.agent(settings)?;

    let stdin = io::stdin();
    let stats = agent.run(EventFeed::new(stdin.lock()));

    crate::log_event!(
        "serve",
        "feed closed",
        "{} events, {} dispatched, {} panicked, {} malformed",
        stats.events,
        stats.dispatched,
        stats.panicked,
        stats.malformed
    );
    Ok(())
}
