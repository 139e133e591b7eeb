// soundbutton - press a button, hear a random clip
// Module declarations
pub mod audio;
pub mod controller;
pub mod input;
pub mod library;
pub mod platform;
pub mod settings;

use anyhow::Context;
use audio::{AudioOutput, AudioSink};
use controller::Controller;
use library::Shuffler;
use platform::{HostDelay, KeyboardPin};
use settings::Settings;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the log subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Already installed (e.g. by an embedding binary) is fine
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Bring up the host devices and hand control to the loop. Only returns on bring-up failure.
pub fn run() -> anyhow::Result<()> {
    init_logging();

    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let settings = Settings::load(&cwd).unwrap_or_else(|e| {
        warn!("{}; using default settings", e);
        Settings::default()
    });

    let output = AudioOutput::new().context("failed to initialize audio output")?;
    info!(
        sample_rate = output.sample_rate(),
        channels = output.channels(),
        "audio output ready"
    );

    match Controller::from_settings(
        &settings,
        KeyboardPin::new(),
        output,
        HostDelay,
        Shuffler::from_entropy(),
    ) {
        Ok(mut controller) => {
            info!("press Enter to play a clip");
            controller.run()
        }
        Err(e) => {
            error!("{}", e);
            info!(directory = ?settings.library.directory, "add audio files and restart");
            controller::halt(&mut HostDelay, settings.controller.halt_poll_ms)
        }
    }
}
