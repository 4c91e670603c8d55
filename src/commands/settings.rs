use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CommuteError, Result};
use crate::state::volume_prefs::{DEFAULT_AD_VOLUME, DEFAULT_CONTENT_VOLUME};
use crate::state::{RetainedState, VolumePreferences};
use crate::utils::logger::log_file_operation;

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "COMMUTE_CONFIG";

/// File Spotify rewrites when its ad state changes.
pub const WATCH_FILE_NAME: &str = "ad-state-storage.bnk.tmp";

const CONFIG_FILE: &str = ".config/ComMute.conf";
const SPOTIFY_USERS_DIR: &str = "Library/Application Support/Spotify/Users";

/// Persisted settings: watch file path, ad volume, content volume, one per
/// line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub watch_file: PathBuf,
    pub ad_volume: u8,
    pub content_volume: u8,
}

impl Settings {
    /// Defaults for a freshly discovered watch file.
    pub fn with_watch_file(watch_file: PathBuf) -> Self {
        Self {
            watch_file,
            ad_volume: DEFAULT_AD_VOLUME,
            content_volume: DEFAULT_CONTENT_VOLUME,
        }
    }

    pub fn from_state(state: &RetainedState) -> Self {
        Self {
            watch_file: state.watch_target.clone(),
            ad_volume: state.volumes.ad_volume(),
            content_volume: state.volumes.content_volume(),
        }
    }

    pub fn volumes(&self) -> VolumePreferences {
        VolumePreferences::from_loaded(self.ad_volume, self.content_volume)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let lines: Vec<&str> = contents.trim().split('\n').collect();
        let [watch_file, ad_volume, content_volume] = lines.as_slice() else {
            return Err(CommuteError::InvalidSettings(format!(
                "expected 3 lines, found {}",
                lines.len()
            )));
        };

        let parse_volume = |name: &str, value: &str| {
            value.trim().parse::<u8>().map_err(|e| {
                CommuteError::InvalidSettings(format!("{} '{}': {}", name, value.trim(), e))
            })
        };

        Ok(Self {
            watch_file: PathBuf::from(watch_file.trim_end_matches('\r')),
            ad_volume: parse_volume("ad volume", *ad_volume)?,
            content_volume: parse_volume("content volume", *content_volume)?,
        })
    }

    pub fn to_file_contents(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.watch_file.display(),
            self.ad_volume,
            self.content_volume
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let result = fs::write(path, self.to_file_contents());
        let path_str = path.display().to_string();
        match &result {
            Ok(()) => log_file_operation("save settings", &path_str, true, None),
            Err(e) => log_file_operation("save settings", &path_str, false, Some(&e.to_string())),
        }
        Ok(result?)
    }
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(CommuteError::NoHomeDir)
}

/// Settings file location: `$COMMUTE_CONFIG` or `~/.config/ComMute.conf`.
pub fn config_path(home: &Path) -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => home.join(CONFIG_FILE),
    }
}

/// Watch file inside the first Spotify user directory.
pub fn discover_watch_file(home: &Path) -> Result<PathBuf> {
    let users_dir = home.join(SPOTIFY_USERS_DIR);
    let mut user_dirs: Vec<PathBuf> = fs::read_dir(&users_dir)
        .map_err(|_| CommuteError::Discovery(users_dir.clone()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    user_dirs.sort();

    let user_dir = user_dirs
        .into_iter()
        .next()
        .ok_or_else(|| CommuteError::Discovery(users_dir.clone()))?;
    Ok(user_dir.join(WATCH_FILE_NAME))
}

/// Load settings, falling back to discovery and default volumes when the
/// file is missing or unreadable. Discovery failure is returned as-is.
pub fn load_or_discover(config: &Path, home: &Path) -> Result<Settings> {
    match Settings::load(config) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", config.display());
            Ok(settings)
        }
        Err(e) => {
            log::info!(
                "No usable settings at {} ({}); discovering Spotify data directory",
                config.display(),
                e
            );
            let watch_file = discover_watch_file(home)?;
            log::info!("Discovered watch file {}", watch_file.display());
            Ok(Settings::with_watch_file(watch_file))
        }
    }
}
