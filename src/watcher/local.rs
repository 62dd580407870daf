//! Recursive directory watcher that emits host event records.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind as NotifyKind, RecursiveMode, Watcher};

use crate::config::WatchConfig;
use crate::event::{EventKind, HostEvent};

use super::debouncer::Debouncer;
use super::error::WatchError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Turns raw notify events into host event records.
///
/// Creations wait in the debouncer and come out of [`ChangeTracker::take_ready`]
/// as `FileAdded`. Everything else is translated immediately.
#[derive(Debug)]
pub struct ChangeTracker {
    debouncer: Debouncer,
}

impl ChangeTracker {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    /// Translate one notify event. Returns the events to emit right away.
    pub fn observe(&mut self, event: Event) -> Vec<HostEvent> {
        let mut emitted = Vec::new();

        match event.kind {
            NotifyKind::Create(_) | NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in event.paths {
                    self.debouncer.record(path);
                }
            }
            NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                if let Some(from) = paths.next() {
                    self.removed(from, &mut emitted);
                }
                for to in paths {
                    self.debouncer.record(to);
                }
            }
            NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) | NotifyKind::Remove(_) => {
                for path in event.paths {
                    self.removed(path, &mut emitted);
                }
            }
            NotifyKind::Modify(_) => {
                for path in event.paths {
                    if self.debouncer.touch(&path) || path.is_dir() {
                        continue;
                    }
                    emitted.push(HostEvent::new(EventKind::FileModified, path));
                }
            }
            _ => {}
        }

        emitted
    }

    fn removed(&mut self, path: PathBuf, emitted: &mut Vec<HostEvent>) {
        // Created and deleted before it settled: never announced.
        if self.debouncer.remove(&path) {
            crate::debug_event!("watcher", "dropped transient", "{}", path.display());
            return;
        }
        emitted.push(HostEvent::new(EventKind::FileRemoved, path));
    }

    /// New files that have been quiet long enough, sorted by path.
    ///
    /// Paths that vanished or turned out to be directories are dropped.
    pub fn take_ready(&mut self) -> Vec<HostEvent> {
        self.debouncer
            .take_ready()
            .into_iter()
            .filter(|path| path.is_file())
            .map(HostEvent::file_added)
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }
}

/// Watches one directory tree and feeds events to a sink.
pub struct LocalWatcher {
    root: PathBuf,
    tracker: ChangeTracker,
    event_rx: Receiver<notify::Result<Event>>,
    _watcher: notify::RecommendedWatcher,
}

impl LocalWatcher {
    pub fn new(root: &Path, config: &WatchConfig) -> Result<Self, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::PathWatchFailed {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let (tx, event_rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watcher is shutting down.
            let _ = tx.send(res);
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            root: root.to_path_buf(),
            tracker: ChangeTracker::new(config.debounce_ms),
            event_rx,
            _watcher: watcher,
        })
    }

    /// Run until `sink` breaks or the notify channel closes.
    pub fn run<F>(mut self, mut sink: F) -> Result<(), WatchError>
    where
        F: FnMut(HostEvent) -> ControlFlow<()>,
    {
        crate::log_event!("watcher", "watching", "{}", self.root.display());

        loop {
            match self.event_rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    for host_event in self.tracker.observe(event) {
                        if sink(host_event).is_break() {
                            return Ok(());
                        }
                    }
                }
                Ok(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::ChannelClosed),
            }

            if self.tracker.has_pending() {
                for host_event in self.tracker.take_ready() {
                    if sink(host_event).is_break() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: NotifyKind, paths: &[&Path]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(path.to_path_buf());
        }
        event
    }

    #[test]
    fn test_create_is_debounced_into_file_added() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.pdf");
        fs::write(&file, "%PDF").unwrap();

        let mut tracker = ChangeTracker::new(0);
        let now = tracker.observe(event(NotifyKind::Create(CreateKind::File), &[&file]));
        assert!(now.is_empty());

        // Writes while pending do not produce FileModified.
        let now = tracker.observe(event(
            NotifyKind::Modify(ModifyKind::Data(DataChange::Content)),
            &[&file],
        ));
        assert!(now.is_empty());

        assert_eq!(tracker.take_ready(), vec![HostEvent::file_added(&file)]);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_modify_and_remove_are_immediate() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.md");
        fs::write(&file, "x").unwrap();

        let mut tracker = ChangeTracker::new(0);
        let modified = tracker.observe(event(
            NotifyKind::Modify(ModifyKind::Data(DataChange::Content)),
            &[&file],
        ));
        assert_eq!(
            modified,
            vec![HostEvent::new(EventKind::FileModified, &file)]
        );

        let removed = tracker.observe(event(NotifyKind::Remove(RemoveKind::File), &[&file]));
        assert_eq!(removed, vec![HostEvent::new(EventKind::FileRemoved, &file)]);
    }

    #[test]
    fn test_transient_file_is_never_announced() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(".docpipe-abc.tmp");

        let mut tracker = ChangeTracker::new(0);
        tracker.observe(event(NotifyKind::Create(CreateKind::File), &[&file]));
        let removed = tracker.observe(event(NotifyKind::Remove(RemoveKind::File), &[&file]));

        assert!(removed.is_empty());
        assert!(tracker.take_ready().is_empty());
    }

    #[test]
    fn test_rename_both_removes_source_and_adds_target() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join(".docpipe-abc.tmp");
        let to = temp.path().join("report.output.md");
        fs::write(&to, "A\n\n").unwrap();

        let mut tracker = ChangeTracker::new(0);
        let now = tracker.observe(event(
            NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[&from, &to],
        ));

        assert_eq!(now, vec![HostEvent::new(EventKind::FileRemoved, &from)]);
        assert_eq!(tracker.take_ready(), vec![HostEvent::file_added(&to)]);
    }

    #[test]
    fn test_vanished_and_directory_paths_are_dropped() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("report.md_chunks");
        fs::create_dir(&dir).unwrap();
        let gone = temp.path().join("gone.pdf");

        let mut tracker = ChangeTracker::new(0);
        tracker.observe(event(NotifyKind::Create(CreateKind::Folder), &[&dir]));
        tracker.observe(event(NotifyKind::Create(CreateKind::File), &[&gone]));

        assert!(tracker.take_ready().is_empty());
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let err = LocalWatcher::new(&missing, &WatchConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, WatchError::PathWatchFailed { .. }));
    }
}
