//! Event command - process a single event record.

use std::path::PathBuf;

use crate::cli::Runtime;
use crate::config::Settings;
use crate::event::HostEvent;

pub fn run(
    runtime: &Runtime,
    settings: &Settings,
    kind: String,
    path: PathBuf,
) -> anyhow::Result<()> {
    let agent = runtime.agent(settings)?;
    let event = HostEvent::new(kind, path);

    agent.on_start();
    let route = agent.on_event(&event);
    agent.on_shutdown();

    // Stdout may be carrying host frames.
    match route {
        Some(route) => eprintln!("{} {}: {route}", event.kind, event.path().display()),
        None => eprintln!("{} {}: panicked", event.kind, event.path().display()),
    }
    Ok(())
}
