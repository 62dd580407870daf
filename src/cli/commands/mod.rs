//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod combine;
pub mod event;
pub mod init;
pub mod serve;
pub mod watch;
