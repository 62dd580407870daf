pub mod bridge;
pub mod cli;
pub mod config;
pub mod event;
pub mod logging;
pub mod pipeline;
pub mod watcher;

pub use bridge::{HostBridge, HostChannel, MemoryChannel};
pub use config::Settings;
pub use event::{EventKind, HostEvent};
pub use pipeline::{Agent, ChunkCombiner, EventClassifier, Readiness, Route, combine_job};
