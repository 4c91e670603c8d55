use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommuteError {
    #[error("no Spotify user directory found under {0}")]
    Discovery(PathBuf),
    #[error("home directory could not be determined")]
    NoHomeDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    InvalidSettings(String),
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
    #[error("watch target has no parent directory: {0}")]
    NoWatchDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, CommuteError>;
