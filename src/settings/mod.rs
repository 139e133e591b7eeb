// Settings module
// Typed runtime settings with defaults and an optional JSON override file

pub mod settings;

pub use settings::{
    ControllerSettings, InputSettings, LibrarySettings, PlaybackSettings, Settings, SettingsError,
};
