use crate::media::PlayerControl;
use crate::utils::logger::log_player_command;

/// Play/pause menu item. Failures are only logged.
pub fn on_play_pause_requested(player: &dyn PlayerControl) {
    let result = player.play_pause();
    log_player_command("play_pause", &result);
}
