use crate::media::PlayerControl;
use crate::state::{AppState, PlaybackMode};
use crate::utils::logger::log_player_command;

/// Ad volume slider moved.
///
/// Stores `max(value, 15)` and returns it so the slider can be snapped to the
/// stored value. Applied to the player right away while an ad is ducked.
pub fn on_ad_volume_changed(state: &AppState, player: &dyn PlayerControl, value: u8) -> u8 {
    let mut retained = state.lock();
    if retained.volumes.ad_volume() == value {
        return value;
    }

    let stored = retained.volumes.set_ad_volume(value);
    log::info!("Ad volume set to {} (requested {})", stored, value);

    if retained.mode() == PlaybackMode::AdPlaying {
        let result = player.set_volume(stored);
        log_player_command("set_volume", &result);
    }
    stored
}

/// Content volume slider moved. Applied right away while content plays.
pub fn on_content_volume_changed(state: &AppState, player: &dyn PlayerControl, value: u8) -> u8 {
    let mut retained = state.lock();
    if retained.volumes.content_volume() == value {
        return value;
    }

    let stored = retained.volumes.set_content_volume(value);
    log::info!("Content volume set to {}", stored);

    if retained.mode() == PlaybackMode::ContentPlaying {
        let result = player.set_volume(stored);
        log_player_command("set_volume", &result);
    }
    stored
}
