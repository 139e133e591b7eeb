//! Switch debouncing for an active-low button on a pulled-up pin.
//!
//! A press is reported on the first high→low edge. The following low→high edge starts a settle
//! window; edges seen inside the window are treated as contact bounce and produce nothing. A pin
//! still held low when the window closes counts as a new press.

/// One logical button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Released,
    Pressed,
    /// Released, but still inside the settle window that ends at `until_ms`
    Settling { until_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    last_high: bool,
    state: DebounceState,
    settle_ms: u64,
}

impl Debouncer {
    pub fn new(settle_ms: u64) -> Self {
        Self {
            last_high: true,
            state: DebounceState::Released,
            settle_ms,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one pin sample taken at `now_ms` (any monotonic millisecond clock)
    pub fn update(&mut self, level_high: bool, now_ms: u64) -> Option<Trigger> {
        if let DebounceState::Settling { until_ms } = self.state {
            if now_ms >= until_ms {
                // Settled: the line counts as high again, so a press held since the window
                // started fires on this sample
                self.state = DebounceState::Released;
                self.last_high = true;
            }
        }

        let falling = self.last_high && !level_high;
        let rising = !self.last_high && level_high;
        self.last_high = level_high;

        match self.state {
            DebounceState::Released if falling => {
                self.state = DebounceState::Pressed;
                Some(Trigger)
            }
            // A bounce inside the window pushes the window out
            DebounceState::Pressed | DebounceState::Settling { .. } if rising => {
                self.state = DebounceState::Settling {
                    until_ms: now_ms.saturating_add(self.settle_ms),
                };
                None
            }
            _ => None,
        }
    }
}
