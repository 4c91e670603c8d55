//! Console front end standing in for the menu bar: reads commands from
//! stdin and routes them to the user-input handlers.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{clipboard, playback, volume};
use crate::media::PlayerControl;
use crate::menu::{ConsoleOut, ConsolePresenter};
use crate::state::{AppState, MAX_VOLUME};

pub const HELP: &str = "commands: pp | ad <0-100> | song <0-100> | copy | menu | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    PlayPause,
    AdVolume(u8),
    ContentVolume(u8),
    CopyTrack,
    ShowMenu,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Result<UserCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("empty command".to_string());
    };
    let argument = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments: '{}'", line.trim()));
    }

    let volume = |arg: Option<&str>| -> Result<u8, String> {
        let arg = arg.ok_or_else(|| format!("'{}' needs a volume", verb))?;
        match arg.parse::<u8>() {
            Ok(v) if v <= MAX_VOLUME => Ok(v),
            _ => Err(format!("volume must be 0-100, got '{}'", arg)),
        }
    };

    match (verb.to_ascii_lowercase().as_str(), argument) {
        ("pp" | "play" | "pause", None) => Ok(UserCommand::PlayPause),
        ("ad", arg) => volume(arg).map(UserCommand::AdVolume),
        ("song" | "content", arg) => volume(arg).map(UserCommand::ContentVolume),
        ("copy", None) => Ok(UserCommand::CopyTrack),
        ("menu", None) => Ok(UserCommand::ShowMenu),
        ("help" | "?", None) => Ok(UserCommand::Help),
        ("quit" | "exit" | "q", None) => Ok(UserCommand::Quit),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

/// Everything a command handler needs.
#[derive(Clone)]
pub struct ConsoleContext {
    pub state: Arc<AppState>,
    pub player: Arc<dyn PlayerControl>,
    pub presenter: Arc<ConsolePresenter<ConsoleOut>>,
}

pub async fn execute(command: UserCommand, ctx: &ConsoleContext) -> Flow {
    match command {
        UserCommand::PlayPause => {
            let player = ctx.player.clone();
            if let Err(e) =
                tokio::task::spawn_blocking(move || playback::on_play_pause_requested(&*player))
                    .await
            {
                log::warn!("Play/pause task failed: {}", e);
            }
        }
        UserCommand::AdVolume(value) => {
            let (state, player) = (ctx.state.clone(), ctx.player.clone());
            match tokio::task::spawn_blocking(move || {
                volume::on_ad_volume_changed(&state, &*player, value)
            })
            .await
            {
                Ok(stored) if stored != value => ctx
                    .presenter
                    .print_line(&format!("ad volume raised to {} (minimum)", stored)),
                Ok(_) => {}
                Err(e) => log::warn!("Ad volume task failed: {}", e),
            }
            ctx.presenter.print_menu();
        }
        UserCommand::ContentVolume(value) => {
            let (state, player) = (ctx.state.clone(), ctx.player.clone());
            if let Err(e) = tokio::task::spawn_blocking(move || {
                volume::on_content_volume_changed(&state, &*player, value)
            })
            .await
            {
                log::warn!("Content volume task failed: {}", e);
            }
            ctx.presenter.print_menu();
        }
        UserCommand::CopyTrack => match clipboard::copy_track_to_clipboard(&ctx.state).await {
            Ok(_) => ctx.presenter.print_line("copied track & URL to clipboard"),
            Err(e) => {
                log::warn!("Copy to clipboard failed: {}", e);
                ctx.presenter.print_line(&format!("copy failed: {}", e));
            }
        },
        UserCommand::ShowMenu => ctx.presenter.print_menu(),
        UserCommand::Help => ctx.presenter.print_line(HELP),
        UserCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// Read commands until `quit` or Ctrl-C. A closed stdin leaves only Ctrl-C
/// as the way out, so the daemon keeps running when started without a
/// terminal.
pub async fn run_input_loop(ctx: ConsoleContext) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => log::info!("Interrupt received"),
                    Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
                }
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(command) => {
                        if execute(command, &ctx).await == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => ctx.presenter.print_line(&format!("{} ({})", e, HELP)),
                },
                Ok(None) => {
                    log::info!("stdin closed; press Ctrl-C to quit");
                    stdin_open = false;
                }
                Err(e) => {
                    log::warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }
}
