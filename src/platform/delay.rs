use embedded_hal::delay::DelayNs;
use std::thread;
use std::time::Duration;

/// `DelayNs` backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(us.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_delay_ms_sleeps_at_least_requested_time() {
        let start = Instant::now();
        HostDelay.delay_ms(15);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
