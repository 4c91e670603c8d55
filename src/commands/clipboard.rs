use crate::state::{AppState, RetainedState};

/// Text copied by the now-playing menu item: display text, then share URL.
pub fn clipboard_text(state: &RetainedState) -> String {
    format!("{}\n{}", state.display_text, state.share_url)
}

/// Copy the current track and its share URL to the system clipboard.
pub async fn copy_track_to_clipboard(state: &AppState) -> Result<String, String> {
    let text = clipboard_text(&state.view());
    let copied = text.clone();

    // Move to blocking task since clipboard operations are synchronous
    tokio::task::spawn_blocking(move || set_clipboard_text(&copied))
        .await
        .map_err(|e| format!("Task failed: {}", e))??;

    log::info!("📋 copied track & URL to clipboard: {}", text.replace('\n', " | "));
    Ok(text)
}

fn set_clipboard_text(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| format!("Failed to initialize arboard clipboard: {}", e))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| format!("Failed to set clipboard text: {}", e))
}
