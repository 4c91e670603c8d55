use std::sync::Arc;
use std::time::Instant;

use crate::log_context;
use crate::media::{PlaybackSnapshot, PlayerControl};
use crate::menu::Presenter;
use crate::state::{AppState, IconMode, PlaybackMode, RetainedState};
use crate::utils::logger::{
    log_operation_complete, log_operation_failed, log_operation_skipped, log_operation_start,
    log_player_command, log_state_transition,
};

const OPERATION: &str = "change_signal";

/// What a successful snapshot means for the player volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Ad started: apply the ad volume.
    Duck,
    /// Ad still playing: nothing to do.
    AdContinues,
    /// Ad ended: restore the content volume.
    Restore,
    /// Content continues: remember the volume the user is listening at.
    LearnContentVolume(u8),
}

/// Decision table for one change signal. Pure and exhaustive over
/// `(was_ad, snapshot.is_advertisement)`; callers only pass successful
/// snapshots.
pub fn decide(was_advertisement: bool, snapshot: &PlaybackSnapshot) -> Decision {
    match (was_advertisement, snapshot.is_advertisement) {
        (false, true) => Decision::Duck,
        (true, true) => Decision::AdContinues,
        (true, false) => Decision::Restore,
        (false, false) => Decision::LearnContentVolume(snapshot.volume),
    }
}

/// Result of one change signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Another signal was being handled; this one was discarded.
    Dropped,
    /// The player query failed; nothing changed this cycle.
    QueryFailed,
    Applied(Decision),
}

enum PresenterUpdate {
    Mode(IconMode),
    DisplayInfo { text: String, url: String },
}

/// Reacts to change signals by ducking or restoring the player volume.
pub struct DuckingStateMachine {
    state: Arc<AppState>,
    player: Arc<dyn PlayerControl>,
    presenter: Arc<dyn Presenter>,
}

impl DuckingStateMachine {
    pub fn new(
        state: Arc<AppState>,
        player: Arc<dyn PlayerControl>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            state,
            player,
            presenter,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn player(&self) -> &Arc<dyn PlayerControl> {
        &self.player
    }

    /// Query the player once. Any failure yields a snapshot with `ok == false`.
    pub fn query_snapshot(&self) -> PlaybackSnapshot {
        let track = self.player.get_current_track();
        log_player_command("get_current_track", &track);

        match track.and_then(|track| PlaybackSnapshot::from_track(&track)) {
            Ok(snapshot) => {
                log::info!(
                    "ad: {}; str: {}; url: {}; vol: {}",
                    snapshot.is_advertisement,
                    snapshot.display_text,
                    snapshot.share_url,
                    snapshot.volume
                );
                snapshot
            }
            Err(e) => {
                log::warn!("Error fetching track info from Spotify ({:?}): {}", e.kind(), e);
                PlaybackSnapshot::failed()
            }
        }
    }

    /// Startup query. Refines the placeholder display fields and, if an ad is
    /// already playing, ducks it right away. Content volume is not learned
    /// here; the persisted preference stands until the first change signal.
    pub fn initialize(&self) -> PlaybackSnapshot {
        let snapshot = self.query_snapshot();
        if !snapshot.ok {
            log::warn!("Initial query failed; assuming content is playing");
            return snapshot;
        }

        let updates = {
            let mut retained = self.state.lock();
            let mut updates = Vec::new();
            if let Decision::Duck = decide(retained.was_advertisement_before, &snapshot) {
                self.apply_decision(&mut retained, Decision::Duck, &mut updates);
            }
            self.absorb(&mut retained, &snapshot, &mut updates);
            updates
        };
        self.publish(updates);
        snapshot
    }

    /// Handle one change signal.
    ///
    /// At most one call runs at a time; a call that finds another in progress
    /// returns `Dropped` without querying the player.
    pub fn handle_change_signal(&self) -> TransitionOutcome {
        let Some(_handling) = self.state.try_begin_handling() else {
            log_operation_skipped(OPERATION, "previous signal still being handled");
            return TransitionOutcome::Dropped;
        };

        let started = Instant::now();
        log::info!(
            "[{}] watchdog event",
            chrono::Local::now().format("%H:%M:%S")
        );
        log_operation_start(OPERATION, &log_context! {});

        // Slider input waits on this lock, so a volume the user sets while
        // the player is queried is never overwritten by the snapshot.
        let (decision, updates) = {
            let mut retained = self.state.lock();
            let snapshot = self.query_snapshot();
            if !snapshot.ok {
                log_operation_failed(OPERATION, "player query failed", &log_context! {});
                return TransitionOutcome::QueryFailed;
            }

            let mut updates = Vec::new();
            let decision = decide(retained.was_advertisement_before, &snapshot);
            self.apply_decision(&mut retained, decision, &mut updates);
            self.absorb(&mut retained, &snapshot, &mut updates);
            (decision, updates)
        };

        // Presenter callbacks may read the state, so they run unlocked.
        self.publish(updates);

        log_operation_complete(
            OPERATION,
            started.elapsed().as_millis() as u64,
            &log_context! { "decision" => format!("{:?}", decision) },
        );
        TransitionOutcome::Applied(decision)
    }

    fn apply_decision(
        &self,
        retained: &mut RetainedState,
        decision: Decision,
        updates: &mut Vec<PresenterUpdate>,
    ) {
        match decision {
            Decision::Duck => {
                let volume = retained.volumes.ad_volume();
                log::info!("🔇 set spotify volume: {}", volume);
                self.set_volume(volume);
                self.enter(retained, PlaybackMode::AdPlaying, updates);
            }
            Decision::AdContinues => {
                log::info!("🔇 ad continues");
            }
            Decision::Restore => {
                let volume = retained.volumes.content_volume();
                log::info!("🔊 set spotify volume: {}", volume);
                self.set_volume(volume);
                self.enter(retained, PlaybackMode::ContentPlaying, updates);
            }
            Decision::LearnContentVolume(volume) => {
                if retained.volumes.content_volume() != volume {
                    log::info!("🔊 update songvol setting: {}", volume);
                }
                retained.volumes.set_content_volume(volume);
            }
        }
    }

    /// Volume commands are fire-and-forget: a failure is logged and the mode
    /// still advances, so the same ad never gets a second command.
    fn set_volume(&self, volume: u8) {
        let result = self.player.set_volume(volume);
        log_player_command("set_volume", &result);
    }

    fn enter(
        &self,
        retained: &mut RetainedState,
        mode: PlaybackMode,
        updates: &mut Vec<PresenterUpdate>,
    ) {
        let from = retained.mode();
        retained.was_advertisement_before = mode == PlaybackMode::AdPlaying;
        log_state_transition("ducking", &format!("{:?}", from), &format!("{:?}", mode));
        updates.push(PresenterUpdate::Mode(mode.into()));
    }

    fn absorb(
        &self,
        retained: &mut RetainedState,
        snapshot: &PlaybackSnapshot,
        updates: &mut Vec<PresenterUpdate>,
    ) {
        if retained.absorb(snapshot) {
            updates.push(PresenterUpdate::DisplayInfo {
                text: retained.display_text.clone(),
                url: retained.share_url.clone(),
            });
        }
    }

    fn publish(&self, updates: Vec<PresenterUpdate>) {
        for update in updates {
            match update {
                PresenterUpdate::Mode(mode) => self.presenter.on_mode_changed(mode),
                PresenterUpdate::DisplayInfo { text, url } => {
                    self.presenter.on_display_info_changed(&text, &url)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MockPlayerControl, PlayerError, TrackInfo};
    use crate::menu::NullPresenter;
    use crate::state::VolumePreferences;
    use mockall::predicate::eq;

    fn snapshot(ad: bool, volume: u8) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_advertisement: ad,
            display_text: String::new(),
            share_url: String::new(),
            volume,
            ok: true,
        }
    }

    fn track(id: &str, volume: u8) -> TrackInfo {
        TrackInfo {
            volume,
            track_id: id.to_string(),
            artist: "Artist".to_string(),
            title: "Title".to_string(),
        }
    }

    fn machine(player: MockPlayerControl, was_ad: bool) -> DuckingStateMachine {
        let mut retained = RetainedState::new("/tmp/watch", VolumePreferences::from_loaded(20, 80));
        retained.was_advertisement_before = was_ad;
        retained.is_advertisement_now = was_ad;
        DuckingStateMachine::new(
            Arc::new(AppState::new(retained)),
            Arc::new(player),
            Arc::new(NullPresenter),
        )
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(false, &snapshot(true, 70)), Decision::Duck);
        assert_eq!(decide(true, &snapshot(true, 70)), Decision::AdContinues);
        assert_eq!(decide(true, &snapshot(false, 55)), Decision::Restore);
        assert_eq!(
            decide(false, &snapshot(false, 55)),
            Decision::LearnContentVolume(55)
        );
    }

    #[test]
    fn test_ad_start_ducks_to_ad_volume() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .times(1)
            .returning(|| Ok(track("spotify:ad:1", 80)));
        player
            .expect_set_volume()
            .with(eq(20))
            .times(1)
            .returning(|_| Ok(()));

        let sm = machine(player, false);
        assert_eq!(
            sm.handle_change_signal(),
            TransitionOutcome::Applied(Decision::Duck)
        );
        assert_eq!(sm.state().mode(), PlaybackMode::AdPlaying);
        assert!(!sm.state().is_handling());
    }

    #[test]
    fn test_ad_end_restores_content_volume() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:track:1", 20)));
        player
            .expect_set_volume()
            .with(eq(80))
            .times(1)
            .returning(|_| Ok(()));

        let sm = machine(player, true);
        assert_eq!(
            sm.handle_change_signal(),
            TransitionOutcome::Applied(Decision::Restore)
        );
        assert_eq!(sm.state().mode(), PlaybackMode::ContentPlaying);
        // Restoring does not learn the (ducked) volume seen in the snapshot.
        assert_eq!(sm.state().volumes().content_volume(), 80);
    }

    #[test]
    fn test_content_continues_learns_volume() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:track:1", 42)));
        player.expect_set_volume().never();

        let sm = machine(player, false);
        sm.handle_change_signal();
        assert_eq!(sm.state().volumes().content_volume(), 42);
    }

    #[test]
    fn test_query_failure_is_a_no_op() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Err(PlayerError::Transport("Spotify got an error".into())));
        player.expect_set_volume().never();

        let sm = machine(player, false);
        assert_eq!(sm.handle_change_signal(), TransitionOutcome::QueryFailed);
        assert!(!sm.state().is_handling());
        assert_eq!(sm.state().view().display_text, crate::state::PLACEHOLDER_DISPLAY_TEXT);
    }

    #[test]
    fn test_malformed_track_id_is_a_no_op() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("not-a-spotify-id", 50)));
        player.expect_set_volume().never();

        let sm = machine(player, true);
        assert_eq!(sm.handle_change_signal(), TransitionOutcome::QueryFailed);
        assert_eq!(sm.state().mode(), PlaybackMode::AdPlaying);
    }

    #[test]
    fn test_failed_duck_still_enters_ad_mode() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:ad:1", 80)));
        player
            .expect_set_volume()
            .times(1)
            .returning(|_| Err(PlayerError::Transport("timeout".into())));

        let sm = machine(player, false);
        assert_eq!(
            sm.handle_change_signal(),
            TransitionOutcome::Applied(Decision::Duck)
        );
        assert_eq!(sm.state().mode(), PlaybackMode::AdPlaying);
        assert!(sm.state().view().is_advertisement_now);

        // Same ad on the next signal: no second volume command.
        assert_eq!(
            sm.handle_change_signal(),
            TransitionOutcome::Applied(Decision::AdContinues)
        );
    }

    #[test]
    fn test_failed_restore_still_leaves_ad_mode() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:track:1", 20)));
        player
            .expect_set_volume()
            .with(eq(80))
            .times(1)
            .returning(|_| Err(PlayerError::Transport("timeout".into())));

        let sm = machine(player, true);
        sm.handle_change_signal();
        assert_eq!(sm.state().mode(), PlaybackMode::ContentPlaying);
    }

    #[test]
    fn test_signal_dropped_while_handling() {
        let mut player = MockPlayerControl::new();
        player.expect_get_current_track().never();

        let sm = machine(player, false);
        let _busy = sm.state().try_begin_handling().unwrap();
        assert_eq!(sm.handle_change_signal(), TransitionOutcome::Dropped);
    }

    #[test]
    fn test_initialize_ducks_ad_already_playing() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:ad:1", 90)));
        player
            .expect_set_volume()
            .with(eq(20))
            .times(1)
            .returning(|_| Ok(()));

        let sm = machine(player, false);
        let snapshot = sm.initialize();
        assert!(snapshot.ok);
        assert_eq!(sm.state().mode(), PlaybackMode::AdPlaying);
    }

    #[test]
    fn test_initialize_does_not_learn_content_volume() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Ok(track("spotify:track:1", 33)));
        player.expect_set_volume().never();

        let sm = machine(player, false);
        sm.initialize();
        let view = sm.state().view();
        assert_eq!(view.volumes.content_volume(), 80);
        assert_eq!(view.display_text, "Artist, Title");
    }

    #[test]
    fn test_initialize_failure_keeps_placeholder() {
        let mut player = MockPlayerControl::new();
        player
            .expect_get_current_track()
            .returning(|| Err(PlayerError::Parse("missing value".into())));

        let sm = machine(player, false);
        assert!(!sm.initialize().ok);
        assert_eq!(sm.state().mode(), PlaybackMode::ContentPlaying);
    }
}
