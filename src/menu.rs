//! Presentation layer: the callbacks the ducking core fires, and a console
//! rendition of the menu bar menu.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::state::{AppState, IconMode, RetainedState};

pub const APP_NAME: &str = "ComMute for Spotify";
pub const APP_VERSION: u32 = 20220106;

const MAX_LABEL_CHARS: usize = 40;
const TRUNCATED_LABEL_CHARS: usize = 35;

/// Receives display-relevant changes from the ducking core.
pub trait Presenter: Send + Sync {
    fn on_display_info_changed(&self, text: &str, url: &str);
    fn on_mode_changed(&self, mode: IconMode);
}

/// Presenter that ignores everything.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn on_display_info_changed(&self, _text: &str, _url: &str) {}
    fn on_mode_changed(&self, _mode: IconMode) {}
}

/// Event payloads written as JSON lines by `ConsolePresenter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PresenterEvent {
    DisplayInfoChanged { text: String, url: String },
    ModeChanged { mode: IconMode },
}

/// Shorten the now-playing label the way the menu bar shows it.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() > MAX_LABEL_CHARS {
        let mut short: String = text.chars().take(TRUNCATED_LABEL_CHARS).collect();
        short.push('…');
        short
    } else {
        text.to_string()
    }
}

/// Menu lines, top to bottom.
pub fn render_menu(state: &RetainedState) -> Vec<String> {
    vec![
        format!("{} {}", APP_NAME, APP_VERSION),
        "-----".to_string(),
        " Play / pause                 [pp]".to_string(),
        format!(" {}  [copy]", truncate_label(&state.display_text)),
        format!(" Ad volume:   {:>3}            [ad <n>]", state.volumes.ad_volume()),
        format!(" Song volume: {:>3}            [song <n>]", state.volumes.content_volume()),
        "-----".to_string(),
        " Quit                         [quit]".to_string(),
    ]
}

/// Writes presenter events as JSON lines and re-renders the menu when the
/// now-playing text changes.
pub struct ConsolePresenter<W: Write + Send> {
    state: Arc<AppState>,
    out: Mutex<W>,
}

/// Boxed writer so the console front end can target stdout or a test buffer.
pub type ConsoleOut = Box<dyn Write + Send>;

impl ConsolePresenter<ConsoleOut> {
    pub fn stdout(state: Arc<AppState>) -> Self {
        Self::new(state, Box::new(std::io::stdout()))
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(state: Arc<AppState>, out: W) -> Self {
        Self {
            state,
            out: Mutex::new(out),
        }
    }

    pub fn print_menu(&self) {
        let lines = render_menu(&self.state.view());
        self.write_lines(&lines);
    }

    /// Free-form status line, e.g. command feedback.
    pub fn print_line(&self, line: &str) {
        self.write_lines(&[line.to_string()]);
    }

    fn emit(&self, event: PresenterEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => self.write_lines(&[line]),
            Err(e) => log::warn!("Failed to serialize presenter event: {}", e),
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                log::warn!("Failed to write to console: {}", e);
                return;
            }
        }
        let _ = out.flush();
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn on_display_info_changed(&self, text: &str, url: &str) {
        log::info!("🎵 Now playing: {} ({})", text, url);
        self.emit(PresenterEvent::DisplayInfoChanged {
            text: text.to_string(),
            url: url.to_string(),
        });
        self.print_menu();
    }

    fn on_mode_changed(&self, mode: IconMode) {
        log::debug!("Icon mode -> {:?}", mode);
        self.emit(PresenterEvent::ModeChanged { mode });
    }
}
