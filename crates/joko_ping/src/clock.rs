use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of "now" for threads that don't see the frame input (the inbound network thread).
/// Must agree with [crate::PingInput::time].
pub trait Clock: Send + Sync {
    /// seconds
    fn now(&self) -> f64;
}

/// seconds since creation
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to. For replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            bits: AtomicU64::new(now.to_bits()),
        }
    }
    /// ignores attempts to move backwards
    pub fn set(&self, now: f64) {
        if now.is_finite() && now >= self.now() {
            self.bits.store(now.to_bits(), Ordering::Release);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_rewinds() {
        let clock = ManualClock::new(2.0);
        clock.set(5.0);
        clock.set(1.0);
        clock.set(f64::NAN);
        assert_eq!(clock.now(), 5.0);
        assert_eq!(ManualClock::default().now(), 0.0);
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
