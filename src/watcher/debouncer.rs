//! Debouncing for newly created files.
//!
//! A file announced by a create event is usually still being written. It is
//! held here until it has been quiet for the configured duration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Holds new paths until they have been stable for `duration`.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending paths: path -> last write seen.
    pending: HashMap<PathBuf, Instant>,
    duration: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record activity on a path. Resets its timer.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Reset the timer only if the path is already pending.
    ///
    /// Returns whether the path was pending.
    pub fn touch(&mut self, path: &Path) -> bool {
        match self.pending.get_mut(path) {
            Some(last) => {
                *last = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Forget a path (deleted before it settled).
    pub fn remove(&mut self, path: &Path) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Take every path that has been quiet long enough, in sorted order.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });

        ready.sort();
        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
