//! Time source abstraction.
//!
//! Code generation, challenge expiry, and reset-token expiry are all
//! time-dependent, so the flows take an explicit [`Clock`] instead of calling
//! `SystemTime::now()` directly. Tests drive a [`ManualClock`] to simulate
//! elapsed time deterministically.

use std::sync::RwLock;
use std::time::{Duration, SystemTime};

/// A source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> SystemTime;
}

/// The real system clock. Default for all flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to. For tests.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<SystemTime>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn starting_at(now: SystemTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }

    /// Jump the clock to an exact instant.
    pub fn set(&self, to: SystemTime) {
        *self.now.write().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn manual_clock_advances() {
        let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = ManualClock::starting_at(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + Duration::from_secs(90));
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::starting_at(UNIX_EPOCH);
        let later = UNIX_EPOCH + Duration::from_secs(3600);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
