// Controller state and main loop
// Owns the catalog, the last-played history, the button and the player
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use rand::Rng;
use tracing::{error, info, warn};

use crate::audio::{AudioSink, Player};
use crate::input::Button;
use crate::library::{Catalog, DirectoryScanner, ScanError, Shuffler};
use crate::settings::Settings;

/// Outcome of one loop iteration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Idle,
    Played(String),
    PlaybackFailed(String),
    NothingToPlay,
}

pub struct Controller<P: InputPin, S: AudioSink, D: DelayNs + Clone, R: Rng> {
    catalog: Catalog,
    shuffler: Shuffler<R>,
    button: Button<P>,
    player: Player<S, D>,
    delay: D,
    poll_interval_ms: u32,
}

impl<P, S, D, R> Controller<P, S, D, R>
where
    P: InputPin,
    S: AudioSink,
    D: DelayNs + Clone,
    R: Rng,
{
    /// Scan the clip directory and wire everything up.
    ///
    /// Fails when the directory can't be read or holds no clips, so a controller always has
    /// a non-empty catalog.
    pub fn from_settings(
        settings: &Settings,
        pin: P,
        sink: S,
        delay: D,
        shuffler: Shuffler<R>,
    ) -> Result<Self, ScanError> {
        let catalog =
            DirectoryScanner::scan(&settings.library.directory, &settings.library.extensions)?;
        info!(
            count = catalog.len(),
            directory = ?catalog.directory(),
            "found audio files"
        );

        let mut player = Player::new(sink, delay.clone(), settings.playback.status_poll_ms);
        player.set_volume(settings.playback.volume);

        Ok(Self {
            catalog,
            shuffler,
            button: Button::new(pin, settings.input.settle_ms),
            player,
            delay,
            poll_interval_ms: settings.input.poll_interval_ms.max(1),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn last_played(&self) -> Option<&str> {
        self.shuffler.last_played()
    }

    /// One pass of the loop: sample the button, play on a press, then rest for the poll interval
    pub fn step(&mut self) -> Step {
        let step = match self.button.poll() {
            Some(_) => self.play_next(),
            None => Step::Idle,
        };
        self.delay.delay_ms(self.poll_interval_ms);
        step
    }

    fn play_next(&mut self) -> Step {
        let Some(name) = self.shuffler.pick(&self.catalog) else {
            warn!("no files available to play");
            return Step::NothingToPlay;
        };

        info!(file = %name, "playing");
        match self.player.play(&self.catalog.path_of(&name)) {
            Ok(_) => Step::Played(name),
            Err(e) => {
                error!(file = %name, "error playing: {}", e);
                Step::PlaybackFailed(name)
            }
        }
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        info!("waiting for button presses");
        loop {
            self.step();
        }
    }
}

/// Idle forever, doing nothing but staying alive
pub fn halt<D: DelayNs>(delay: &mut D, poll_ms: u32) -> ! {
    loop {
        delay.delay_ms(poll_ms.max(1));
    }
}
