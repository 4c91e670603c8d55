//! Spotify backend driven through AppleScript (`osascript -e`).
//!
//! Only functional on macOS. Elsewhere `osascript` cannot be spawned and each
//! call fails with a transport error, which callers already tolerate.

use std::process::Command;

use super::controller::{PlayerControl, PlayerError, TrackInfo};

const PLAY_PAUSE_SCRIPT: &str = r#"
    tell application "Spotify"
        playpause
    end tell
"#;

const GET_VOLUME_SCRIPT: &str = r#"
    tell application "Spotify"
        return sound volume
    end tell
"#;

const CURRENT_TRACK_SCRIPT: &str = r#"
    tell application "Spotify"
        set c to the current track
        return {sound volume, id of c, artist of c, name of c}
    end tell
"#;

fn set_volume_script(volume: u8) -> String {
    format!(
        r#"
    tell application "Spotify"
        set sound volume to {}
    end tell
"#,
        volume
    )
}

/// Controls the Spotify desktop client with AppleScript.
#[derive(Debug, Clone)]
pub struct SpotifyController {
    program: String,
}

impl Default for SpotifyController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotifyController {
    pub fn new() -> Self {
        Self {
            program: "osascript".to_string(),
        }
    }

    /// Use a different script interpreter binary (same `-e <script>` calling
    /// convention).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run_script(&self, script: &str) -> Result<String, PlayerError> {
        let output = Command::new(&self.program).arg("-e").arg(script).output()?;

        // A non-empty error stream is a failure even when the exit status is 0.
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::debug!(
                "AppleScript stdout before failure: {}",
                String::from_utf8_lossy(&output.stdout)
            );
            return Err(PlayerError::Transport(stderr.trim().to_string()));
        }
        if !output.status.success() {
            return Err(PlayerError::Transport(format!(
                "{} exited with status {:?}",
                self.program,
                output.status.code()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| PlayerError::Parse(format!("response is not UTF-8: {}", e)))
    }
}

impl PlayerControl for SpotifyController {
    fn play_pause(&self) -> Result<(), PlayerError> {
        self.run_script(PLAY_PAUSE_SCRIPT).map(|_| ())
    }

    fn get_volume(&self) -> Result<u8, PlayerError> {
        let response = self.run_script(GET_VOLUME_SCRIPT)?;
        parse_volume_response(&response)
    }

    fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        self.run_script(&set_volume_script(volume)).map(|_| ())
    }

    fn get_current_track(&self) -> Result<TrackInfo, PlayerError> {
        let response = self.run_script(CURRENT_TRACK_SCRIPT)?;
        parse_track_response(&response)
    }
}

fn parse_volume(field: &str) -> Result<u8, PlayerError> {
    let field = field.trim();
    match field.parse::<u8>() {
        Ok(volume) if volume <= 100 => Ok(volume),
        _ => Err(PlayerError::Parse(format!("invalid volume '{}'", field))),
    }
}

/// Parse the single-integer answer to a volume query.
pub fn parse_volume_response(response: &str) -> Result<u8, PlayerError> {
    parse_volume(response)
}

/// Parse `volume, track id, artist, title`.
///
/// The title keeps any commas it contains. Fewer than four fields or a
/// non-numeric volume is a parse failure.
pub fn parse_track_response(response: &str) -> Result<TrackInfo, PlayerError> {
    let mut fields = response.trim().splitn(4, ',');
    let (Some(volume), Some(track_id), Some(artist), Some(title)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(PlayerError::Parse(format!(
            "expected 4 comma-separated fields, got '{}'",
            response.trim()
        )));
    };

    Ok(TrackInfo {
        volume: parse_volume(volume)?,
        track_id: track_id.trim().to_string(),
        artist: artist.trim().to_string(),
        title: title.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FailureKind;

    #[test]
    fn test_parse_track_response() {
        let info =
            parse_track_response("64, spotify:track:4uLU6hMCjMI75M1A2tKUQC, Rick Astley, Never Gonna Give You Up\n")
                .unwrap();
        assert_eq!(info.volume, 64);
        assert_eq!(info.track_id, "spotify:track:4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(info.artist, "Rick Astley");
        assert_eq!(info.title, "Never Gonna Give You Up");
    }

    #[test]
    fn test_parse_track_response_keeps_commas_in_title() {
        let info = parse_track_response("10, spotify:track:abc, Crosby, Stills & Nash").unwrap();
        assert_eq!(info.artist, "Crosby");
        assert_eq!(info.title, "Stills & Nash");
    }

    #[test]
    fn test_parse_track_response_too_few_fields() {
        let err = parse_track_response("50, spotify:ad:123").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_parse_track_response_non_numeric_volume() {
        let err = parse_track_response("missing value, spotify:track:abc, A, B").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_parse_volume_response() {
        assert_eq!(parse_volume_response("100\n").unwrap(), 100);
        assert_eq!(parse_volume_response(" 0 ").unwrap(), 0);
        assert!(parse_volume_response("101").is_err());
        assert!(parse_volume_response("").is_err());
        assert!(parse_volume_response("loud").is_err());
    }

    #[test]
    fn test_set_volume_script_embeds_level() {
        assert!(set_volume_script(37).contains("set sound volume to 37"));
    }

    #[test]
    fn test_missing_interpreter_is_transport_failure() {
        let controller = SpotifyController::with_program("commute-no-such-osascript");
        let err = controller.get_volume().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_status_is_transport_failure() {
        let controller = SpotifyController::with_program("false");
        let err = controller.play_pause().unwrap_err();
        assert!(matches!(err, PlayerError::Transport(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unexpected_output_is_parse_failure() {
        // `echo -e <script>` succeeds and prints the script back.
        let controller = SpotifyController::with_program("echo");
        let err = controller.get_current_track().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }
}
