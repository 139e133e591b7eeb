use embedded_hal::digital::InputPin;
use std::time::Instant;
use tracing::{debug, warn};

use super::debounce::{Debouncer, Trigger};

/// A pulled-up push button sampled on demand
pub struct Button<P: InputPin> {
    pin: P,
    debouncer: Debouncer,
    started: Instant,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, settle_ms: u64) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(settle_ms),
            started: Instant::now(),
        }
    }

    /// Sample the pin once. A failed read counts as "not pressed".
    pub fn poll(&mut self) -> Option<Trigger> {
        let level_high = match self.pin.is_high() {
            Ok(level) => level,
            Err(e) => {
                warn!("button read failed: {:?}", e);
                true
            }
        };
        let now_ms = self.started.elapsed().as_millis() as u64;

        let trigger = self.debouncer.update(level_high, now_ms);
        if trigger.is_some() {
            debug!(now_ms, "button pressed");
        }
        trigger
    }
}
