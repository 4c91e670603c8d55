use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{ChangeSource, WatchEvent};
use crate::error::Result;

/// Platform file notifications (FSEvents on macOS, inotify on Linux,
/// ReadDirectoryChangesW on Windows) through the `notify` crate.
#[derive(Default)]
pub struct NotifySource {
    // The watcher stops delivering events once dropped, so keep it alive.
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(&mut self, dir: &Path) -> Result<Receiver<WatchEvent>> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for watch_event in convert_event(&event) {
                        // Receiver gone means the watcher is shutting down.
                        let _ = tx.send(watch_event);
                    }
                }
                Err(e) => log::warn!("File watcher error: {}", e),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        log::info!("Watching {} for changes", dir.display());

        self.watcher = Some(watcher);
        Ok(rx)
    }
}

fn convert_event(event: &Event) -> Vec<WatchEvent> {
    let make: fn(std::path::PathBuf) -> WatchEvent = match event.kind {
        EventKind::Create(_) => WatchEvent::Created,
        EventKind::Modify(_) => WatchEvent::Modified,
        EventKind::Remove(_) => WatchEvent::Removed,
        _ => return Vec::new(),
    };
    event.paths.iter().cloned().map(make).collect()
}
