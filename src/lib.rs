use std::path::Path;
use std::sync::Arc;

pub mod commands;
pub mod console;
pub mod error;
pub mod media;
pub mod menu;
pub mod state;
pub mod state_machine;
pub mod utils;
pub mod watcher;


pub use error::{CommuteError, Result};
pub use media::{PlaybackSnapshot, PlayerControl, SpotifyController};
pub use menu::Presenter;
pub use state::{AppState, IconMode, PlaybackMode, RetainedState, VolumePreferences};
pub use state_machine::{decide, Decision, DuckingStateMachine, TransitionOutcome};
pub use watcher::{ChangeSignal, ChangeSource, NotifySource, WatchEvent};

use commands::settings::{self, Settings};
use console::ConsoleContext;
use menu::ConsolePresenter;
use utils::logger::{init_logging, log_lifecycle_event};

/// Start ComMute: load settings, take over ducking, and serve console input
/// until quit.
pub fn run() -> Result<()> {
    init_logging();
    log_lifecycle_event("STARTUP", None);

    let home = settings::home_dir()?;
    let config_path = settings::config_path(&home);
    // No watch target means nothing can ever fire; this is fatal.
    let loaded = settings::load_or_discover(&config_path, &home)?;

    let state = Arc::new(AppState::new(RetainedState::new(
        loaded.watch_file.clone(),
        loaded.volumes(),
    )));
    let player: Arc<dyn PlayerControl> = Arc::new(SpotifyController::new());
    let presenter = Arc::new(ConsolePresenter::stdout(state.clone()));
    let machine = Arc::new(DuckingStateMachine::new(
        state.clone(),
        player.clone(),
        presenter.clone(),
    ));

    presenter.print_menu();
    machine.initialize();

    let handler_machine = machine.clone();
    let signal = ChangeSignal::start(
        NotifySource::new(),
        &loaded.watch_file,
        Arc::new(move || {
            handler_machine.handle_change_signal();
        }),
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(console::run_input_loop(ConsoleContext {
        state: state.clone(),
        player,
        presenter,
    }));

    shutdown(signal, &state, &config_path)
}

/// Stop the watcher, then flush settings. The watcher is joined first so no
/// change signal can touch the volumes while they are written.
pub fn shutdown(signal: ChangeSignal, state: &AppState, config_path: &Path) -> Result<()> {
    log::info!("quitting");
    signal.stop();
    drop(signal);

    let result = Settings::from_state(&state.view()).save(config_path);
    log_lifecycle_event("SHUTDOWN", None);
    result
}
