use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use embedded_hal::digital::{ErrorType, InputPin};
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tracing::warn;

/// Gap between samples after which queued key presses are considered stale
const STALE_AFTER: Duration = Duration::from_millis(250);

/// Terminal input as an active-low pin.
///
/// The pin reads low for exactly one sample after Enter (or space) was pressed. Presses that piled up
/// while nobody sampled the pin, e.g. during playback, are discarded, matching a real button that
/// nobody polled.
pub struct KeyboardPin {
    last_sample: Option<Instant>,
}

impl KeyboardPin {
    pub fn new() -> Self {
        Self { last_sample: None }
    }

    /// Drain pending terminal events and report whether any of them was a press
    fn take_press(&mut self) -> bool {
        let now = Instant::now();
        let stale = self
            .last_sample
            .map(|last| now.duration_since(last) > STALE_AFTER)
            .unwrap_or(false);
        self.last_sample = Some(now);

        let mut pressed = false;
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key))
                        if key.kind == KeyEventKind::Press
                            && matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) =>
                    {
                        pressed = true;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    warn!("failed to poll terminal events: {}", e);
                    break;
                }
            }
        }

        pressed && !stale
    }
}

impl Default for KeyboardPin {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for KeyboardPin {
    type Error = Infallible;
}

impl InputPin for KeyboardPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.take_press())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.take_press())
    }
}
