use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{ChangeSource, WatchEvent};
use crate::error::{CommuteError, Result};

/// How often the watch thread checks for a stop request.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Invoked once per creation of the watch file.
pub type SignalHandler = Arc<dyn Fn() + Send + Sync>;

/// Background watcher that fires a handler when the watch file is created.
///
/// Each firing runs on its own short-lived thread so a slow handler never
/// delays event intake; overlapping firings are resolved by the handler
/// itself. No debouncing happens here.
pub struct ChangeSignal {
    target: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ChangeSignal {
    /// Subscribe to the parent directory of `target` and start the watch
    /// thread.
    pub fn start<S: ChangeSource>(
        mut source: S,
        target: &Path,
        handler: SignalHandler,
    ) -> Result<Self> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| CommuteError::NoWatchDirectory(target.to_path_buf()))?;
        let events = source.subscribe(dir)?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let watch_target = target.to_path_buf();
        let handle = thread::Builder::new()
            .name("change-signal".to_string())
            .spawn(move || {
                // Keep the source alive for as long as events are consumed.
                let _source = source;
                watch_loop(events, &watch_target, &stop_flag, handler);
            })?;

        log::info!("ChangeSignal started for {}", target.display());
        Ok(Self {
            target: target.to_path_buf(),
            stop,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn is_running(&self) -> bool {
        match self.handle.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|h| !h.is_finished()),
            Err(_) => false,
        }
    }

    /// Stop the watch thread and wait for it, including any firing still in
    /// flight. Idempotent.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);

        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(err) = handle.join() {
                log::debug!("ChangeSignal thread join failed: {:?}", err);
            } else {
                log::info!("ChangeSignal stopped");
            }
        }
    }
}

impl Drop for ChangeSignal {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(
    events: Receiver<WatchEvent>,
    target: &Path,
    stop: &AtomicBool,
    handler: SignalHandler,
) {
    let mut firings: Vec<thread::JoinHandle<()>> = Vec::new();

    while !stop.load(Ordering::SeqCst) {
        match events.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(WatchEvent::Created(path)) if path == target => {
                firings.retain(|h| !h.is_finished());
                let handler = handler.clone();
                match thread::Builder::new()
                    .name("change-signal-fire".to_string())
                    .spawn(move || handler())
                {
                    Ok(handle) => firings.push(handle),
                    Err(e) => log::warn!("Failed to dispatch change signal: {}", e),
                }
            }
            Ok(event) => log::trace!("Ignoring watch event {:?}", event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("File event stream closed; change signal no longer fires");
                break;
            }
        }
    }

    for firing in firings {
        if let Err(err) = firing.join() {
            log::debug!("Change signal handler panicked: {:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ChannelSource;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Instant;

    fn wait_for(count: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn counting_handler() -> (Arc<AtomicUsize>, SignalHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let handler: SignalHandler = Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, handler)
    }

    #[test]
    fn test_fires_once_per_creation_of_target() {
        let (tx, rx) = mpsc::channel();
        let (count, handler) = counting_handler();
        let target = PathBuf::from("/spotify/Users/me/ad-state-storage.bnk.tmp");

        let signal = ChangeSignal::start(ChannelSource::new(rx), &target, handler).unwrap();
        tx.send(WatchEvent::Created(target.clone())).unwrap();
        tx.send(WatchEvent::Created(target.clone())).unwrap();
        wait_for(&count, 2);
        signal.stop();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ignores_other_paths_and_kinds() {
        let (tx, rx) = mpsc::channel();
        let (count, handler) = counting_handler();
        let target = PathBuf::from("/spotify/Users/me/ad-state-storage.bnk.tmp");

        let signal = ChangeSignal::start(ChannelSource::new(rx), &target, handler).unwrap();
        tx.send(WatchEvent::Created(PathBuf::from("/spotify/Users/me/other.tmp")))
            .unwrap();
        tx.send(WatchEvent::Modified(target.clone())).unwrap();
        tx.send(WatchEvent::Removed(target.clone())).unwrap();
        tx.send(WatchEvent::Created(target.clone())).unwrap();
        wait_for(&count, 1);
        signal.stop();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_joins_thread_and_is_idempotent() {
        let (_tx, rx) = mpsc::channel();
        let (_count, handler) = counting_handler();
        let signal =
            ChangeSignal::start(ChannelSource::new(rx), Path::new("/a/b"), handler).unwrap();

        assert!(signal.is_running());
        signal.stop();
        assert!(!signal.is_running());
        signal.stop();
    }

    #[test]
    fn test_stop_waits_for_in_flight_firing() {
        let (tx, rx) = mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_clone = finished.clone();
        let started = Arc::new(AtomicUsize::new(0));
        let started_clone = started.clone();
        let handler: SignalHandler = Arc::new(move || {
            started_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(300));
            finished_clone.store(true, Ordering::SeqCst);
        });
        let target = PathBuf::from("/a/watch");

        let signal = ChangeSignal::start(ChannelSource::new(rx), &target, handler).unwrap();
        tx.send(WatchEvent::Created(target.clone())).unwrap();
        wait_for(&started, 1);
        signal.stop();

        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_target_without_parent_is_rejected() {
        let (_tx, rx) = mpsc::channel();
        let (_count, handler) = counting_handler();
        let result = ChangeSignal::start(ChannelSource::new(rx), Path::new("watch"), handler);
        assert!(matches!(result, Err(CommuteError::NoWatchDirectory(_))));
    }
}
