//! Media player remote control for ad ducking.
//!
//! - `controller`: the `PlayerControl` trait every player backend implements
//! - `applescript`: Spotify on macOS, driven through `osascript`
//! - `track`: ad classification and point-in-time playback snapshots

mod applescript;
mod controller;
mod track;

pub use applescript::{parse_track_response, parse_volume_response, SpotifyController};
pub use controller::{FailureKind, PlayerControl, PlayerError, TrackInfo};
#[cfg(test)]
pub use controller::MockPlayerControl;
pub use track::{
    classify, is_advertisement, to_share_url, PlaybackSnapshot, TrackKind, AD_DISPLAY_TEXT, AD_PREFIX,
};
