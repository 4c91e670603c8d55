//! Handlers for user input coming from the presentation layer, plus the
//! persisted settings they share.

pub mod clipboard;
pub mod playback;
pub mod settings;
pub mod volume;
