pub mod app_state;
pub mod volume_prefs;

pub use app_state::{
    AppState, HandlingGuard, IconMode, PlaybackMode, RetainedState, PLACEHOLDER_DISPLAY_TEXT,
    PLACEHOLDER_SHARE_URL,
};
pub use volume_prefs::{VolumePreferences, AD_VOLUME_FLOOR, MAX_VOLUME};
