//! Change signal: fires once per creation of the watch file.
//!
//! The filesystem event source sits behind `ChangeSource` so tests can feed
//! events through a plain channel.

mod change_signal;
mod notify_source;

pub use change_signal::{ChangeSignal, SignalHandler};
pub use notify_source::NotifySource;

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use crate::error::Result;

/// Filesystem event relevant to the change signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file was created in the watched directory
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

/// A source of filesystem events for one directory.
pub trait ChangeSource: Send + 'static {
    /// Start delivering events for entries of `dir`. The stream ends when the
    /// source is dropped.
    fn subscribe(&mut self, dir: &Path) -> Result<Receiver<WatchEvent>>;
}

/// Hands out a prepared receiver. Used by tests and by callers that produce
/// events themselves.
pub struct ChannelSource {
    rx: Option<Receiver<WatchEvent>>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<WatchEvent>) -> Self {
        Self { rx: Some(rx) }
    }
}

impl ChangeSource for ChannelSource {
    fn subscribe(&mut self, _dir: &Path) -> Result<Receiver<WatchEvent>> {
        self.rx.take().ok_or_else(|| {
            crate::error::CommuteError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "channel source already subscribed",
            ))
        })
    }
}
