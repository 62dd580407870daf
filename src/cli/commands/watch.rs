//! Watch command - local directory watcher as the event source.

use std::ops::ControlFlow;
use std::path::Path;

use crate::cli::Runtime;
use crate::config::Settings;
use crate::watcher::LocalWatcher;

pub fn run(runtime: &Runtime, settings: &Settings, dir: &Path) -> anyhow::Result<()> {
    let agent = runtime.agent(settings)?;
    let watcher = LocalWatcher::new(dir, &settings.watch)?;

    agent.on_start();
    let result = watcher.run(|event| {
        agent.on_event(&event);
        ControlFlow::Continue(())
    });
    agent.on_shutdown();

    Ok(result?)
}
