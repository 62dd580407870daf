//! Command-line interface: argument parsing and command dispatch.

pub mod args;
pub mod commands;
mod runtime;

pub use args::{Cli, Commands};
pub use runtime::Runtime;
