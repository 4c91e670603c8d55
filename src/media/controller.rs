//! Synchronous request/response control surface of a media player.
//!
//! Every call is blocking and independently failable. Nothing here retries;
//! callers decide what a failure means for the current cycle.

use thiserror::Error;

/// Broad category of a failed player call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote channel itself failed (error stream, spawn failure).
    Transport,
    /// The channel answered but the response had an unexpected shape.
    Parse,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to spawn remote channel: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("remote channel returned error: {0}")]
    Transport(String),
    #[error("unexpected player response: {0}")]
    Parse(String),
}

impl PlayerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PlayerError::Spawn(_) | PlayerError::Transport(_) => FailureKind::Transport,
            PlayerError::Parse(_) => FailureKind::Parse,
        }
    }
}

/// Raw current-track answer from the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub volume: u8,
    pub track_id: String,
    pub artist: String,
    pub title: String,
}

/// Remote control of a single media player.
#[cfg_attr(test, mockall::automock)]
pub trait PlayerControl: Send + Sync {
    /// Toggle play/pause. Fire-and-forget.
    fn play_pause(&self) -> Result<(), PlayerError>;

    /// Current output volume, 0..=100.
    fn get_volume(&self) -> Result<u8, PlayerError>;

    /// Set output volume. The caller keeps `volume` within 0..=100; there is
    /// no read-back.
    fn set_volume(&self, volume: u8) -> Result<(), PlayerError>;

    fn get_current_track(&self) -> Result<TrackInfo, PlayerError>;
}
