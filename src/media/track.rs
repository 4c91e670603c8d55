use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::controller::{PlayerError, TrackInfo};

/// Identifier prefix Spotify uses for advertisements.
pub const AD_PREFIX: &str = "spotify:ad:";

/// Display text shown while an advertisement plays.
pub const AD_DISPLAY_TEXT: &str = "(advertisement)";

static TRACK_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^:]+:([^:]+):([^:]+)$").expect("valid track id pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackKind {
    Advertisement,
    Content,
}

pub fn classify(track_id: &str) -> TrackKind {
    if track_id.starts_with(AD_PREFIX) {
        TrackKind::Advertisement
    } else {
        TrackKind::Content
    }
}

pub fn is_advertisement(track_id: &str) -> bool {
    classify(track_id) == TrackKind::Advertisement
}

/// `namespace:category:id` -> `http://open.spotify.com/{category}/{id}`
pub fn to_share_url(track_id: &str) -> Result<String, PlayerError> {
    let captures = TRACK_ID_PATTERN
        .captures(track_id)
        .ok_or_else(|| PlayerError::Parse(format!("unrecognised track id '{}'", track_id)))?;
    Ok(format!(
        "http://open.spotify.com/{}/{}",
        &captures[1], &captures[2]
    ))
}

/// One point-in-time read of the player. `ok == false` means the query
/// failed and every other field is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub is_advertisement: bool,
    pub display_text: String,
    pub share_url: String,
    pub volume: u8,
    pub ok: bool,
}

impl PlaybackSnapshot {
    pub fn failed() -> Self {
        Self {
            is_advertisement: false,
            display_text: String::new(),
            share_url: String::new(),
            volume: 0,
            ok: false,
        }
    }

    pub fn from_track(track: &TrackInfo) -> Result<Self, PlayerError> {
        let is_advertisement = is_advertisement(&track.track_id);
        let display_text = if is_advertisement {
            AD_DISPLAY_TEXT.to_string()
        } else {
            format!("{}, {}", track.artist, track.title)
        };

        Ok(Self {
            is_advertisement,
            display_text,
            share_url: to_share_url(&track.track_id)?,
            volume: track.volume,
            ok: true,
        })
    }
}
