// Settings management
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable that points at an alternative settings file
pub const SETTINGS_PATH_ENV: &str = "SOUNDBUTTON_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the clips live and which files count as clips
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibrarySettings {
    pub directory: PathBuf,
    pub extensions: Vec<String>, // compared case-insensitively
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("mp3"),
            extensions: vec!["mp3".to_string()],
        }
    }
}

/// Button sampling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    pub poll_interval_ms: u32,
    pub settle_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            settle_ms: 50,
        }
    }
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    pub status_poll_ms: u32,
    pub volume: f32, // 0.0-1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            status_poll_ms: 100,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerSettings {
    /// Sleep between liveness ticks once the controller has nothing to play
    pub halt_poll_ms: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self { halt_poll_ms: 1000 }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub input: InputSettings,
    pub playback: PlaybackSettings,
    pub controller: ControllerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library: LibrarySettings::default(),
            input: InputSettings::default(),
            playback: PlaybackSettings::default(),
            controller: ControllerSettings::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path inside `dir`, honouring the override variable
    pub fn get_settings_path(dir: &Path) -> PathBuf {
        match std::env::var_os(SETTINGS_PATH_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => dir.join("settings.json"),
        }
    }

    /// Load settings from `dir`, or return defaults if no file exists
    pub fn load(dir: &Path) -> Result<Self, SettingsError> {
        Self::load_from(&Self::get_settings_path(dir))
    }

    /// Load settings from an explicit file path, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!(?path, "no settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(?path, "loaded settings");
        Ok(settings)
    }
}
