//! Time source for expiry and rate limiting.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Wall-clock abstraction so expiry and cooldowns can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Time never goes backwards: `set` to an earlier instant is ignored.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Starts at the Unix epoch.
    #[must_use]
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Move forward by `by`. Negative durations are ignored.
    pub fn advance(&self, by: Duration) {
        if by <= Duration::zero() {
            return;
        }
        if let Ok(mut now) = self.now.lock() {
            if let Some(next) = now.checked_add_signed(by) {
                *now = next;
            }
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            if to > *now {
                *now = to;
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_epoch();
        let t0 = clock.now();
        clock.advance_secs(10);
        assert_eq!(clock.now() - t0, Duration::seconds(10));
    }

    #[test]
    fn manual_clock_never_rewinds() {
        let clock = ManualClock::at_epoch();
        clock.advance_secs(100);
        let t = clock.now();
        clock.advance_secs(-50);
        clock.set(DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(clock.now(), t);
    }

    #[test]
    fn system_clock_is_monotone_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
