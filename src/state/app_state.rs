use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::media::PlaybackSnapshot;
use crate::state::volume_prefs::VolumePreferences;

pub const PLACEHOLDER_DISPLAY_TEXT: &str = "<unable to communicate with Spotify>";
pub const PLACEHOLDER_SHARE_URL: &str = "https://github.com/cwverhey/ComMute/";

/// Which volume level is currently applied to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum PlaybackMode {
    #[default]
    ContentPlaying,
    AdPlaying,
}

/// Menu bar icon shown by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconMode {
    Normal,
    Muted,
}

impl From<PlaybackMode> for IconMode {
    fn from(mode: PlaybackMode) -> Self {
        match mode {
            PlaybackMode::ContentPlaying => IconMode::Normal,
            PlaybackMode::AdPlaying => IconMode::Muted,
        }
    }
}

/// Everything the ducking logic remembers between change signals.
#[derive(Debug, Clone)]
pub struct RetainedState {
    pub is_advertisement_now: bool,
    pub was_advertisement_before: bool,
    pub display_text: String,
    pub share_url: String,
    /// Player volume seen by the last successful query.
    pub volume: u8,
    pub volumes: VolumePreferences,
    pub watch_target: PathBuf,
}

impl RetainedState {
    pub fn new(watch_target: impl Into<PathBuf>, volumes: VolumePreferences) -> Self {
        Self {
            is_advertisement_now: false,
            was_advertisement_before: false,
            display_text: PLACEHOLDER_DISPLAY_TEXT.to_string(),
            share_url: PLACEHOLDER_SHARE_URL.to_string(),
            volume: volumes.content_volume(),
            volumes,
            watch_target: watch_target.into(),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        if self.was_advertisement_before {
            PlaybackMode::AdPlaying
        } else {
            PlaybackMode::ContentPlaying
        }
    }

    /// Fold a successful snapshot into the retained playback fields. Returns
    /// true when the display text changed.
    pub fn absorb(&mut self, snapshot: &PlaybackSnapshot) -> bool {
        if !snapshot.ok {
            return false;
        }
        let display_changed = self.display_text != snapshot.display_text;
        self.is_advertisement_now = snapshot.is_advertisement;
        self.display_text = snapshot.display_text.clone();
        self.share_url = snapshot.share_url.clone();
        self.volume = snapshot.volume;
        display_changed
    }
}

/// Process-wide state shared between the watcher thread and user input.
///
/// All fields of `RetainedState` sit behind one mutex. `handling_in_progress`
/// is claimed with a compare-exchange so at most one change signal is handled
/// at a time; a signal that loses the race is dropped.
pub struct AppState {
    retained: Mutex<RetainedState>,
    handling_in_progress: AtomicBool,
}

impl AppState {
    pub fn new(retained: RetainedState) -> Self {
        Self {
            retained: Mutex::new(retained),
            handling_in_progress: AtomicBool::new(false),
        }
    }

    /// Lock the retained state, recovering from poison if necessary
    pub fn lock(&self) -> MutexGuard<'_, RetainedState> {
        match self.retained.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Recovering from poisoned mutex in AppState");
                poisoned.into_inner()
            }
        }
    }

    /// Copy of the retained state for display.
    pub fn view(&self) -> RetainedState {
        self.lock().clone()
    }

    pub fn volumes(&self) -> VolumePreferences {
        self.lock().volumes
    }

    pub fn mode(&self) -> PlaybackMode {
        self.lock().mode()
    }

    pub fn watch_target(&self) -> PathBuf {
        self.lock().watch_target.clone()
    }

    pub fn is_handling(&self) -> bool {
        self.handling_in_progress.load(Ordering::SeqCst)
    }

    /// Claim the handling flag. `None` means another handler is running and
    /// the caller must drop its event. The flag is released when the guard
    /// goes out of scope, whichever way the handler exits.
    pub fn try_begin_handling(&self) -> Option<HandlingGuard<'_>> {
        self.handling_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| HandlingGuard {
                flag: &self.handling_in_progress,
            })
    }
}

pub struct HandlingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
