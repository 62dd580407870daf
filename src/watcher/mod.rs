//! Local watch mode: a stand-in host event source.
//!
//! # Architecture
//!
//! ```text
//! LocalWatcher
//!   - notify::RecommendedWatcher (recursive)
//!   - crossbeam channel of raw notify events
//!   - ChangeTracker
//!       create           -> Debouncer -> FileAdded (once quiet)
//!       modify (pending) -> Debouncer reset
//!       modify           -> FileModified
//!       remove           -> FileRemoved
//! ```

mod debouncer;
mod error;
mod local;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use local::{ChangeTracker, LocalWatcher};
