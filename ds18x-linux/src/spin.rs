use embedded_hal::delay::DelayNs;
use std::time::{Duration, Instant};

/// Busy-waiting delay for 1-Wire time slots.
///
/// `thread::sleep` overshoots by tens of microseconds, longer than a whole slot.
/// Spinning keeps the slot timing, at the cost of a busy core.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let end = Instant::now() + Duration::from_nanos(ns as u64);
        while Instant::now() < end {
            core::hint::spin_loop();
        }
    }
}
