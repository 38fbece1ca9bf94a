//! Time sources.
//!
//! The approval delay and the refund timeout compare against a timestamp
//! read from a [`Clock`]. Production uses the wall clock; tests use a
//! [`ManualClock`] and advance it explicitly to cross the delay threshold.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current time. Must be monotonic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move time forward. Negative deltas are ignored so the clock stays
    /// monotonic; it stops at the last representable instant.
    pub fn advance(&self, delta: TimeDelta) {
        self.advance_millis(delta.num_milliseconds());
    }

    /// Move time forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        if secs <= 0 {
            return;
        }
        let step = TimeDelta::try_seconds(secs).map_or(i64::MAX, |d| d.num_milliseconds());
        self.advance_millis(step);
    }

    fn advance_millis(&self, step: i64) {
        let ceiling = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        let step = step.max(0);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.checked_add(step).map_or(ceiling, |next| next.min(ceiling)))
            });
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance_secs(86_400);
        assert_eq!(clock.now(), start + TimeDelta::days(1));
    }

    #[test]
    fn manual_clock_never_goes_back() {
        let clock = ManualClock::default();
        let before = clock.now();
        clock.advance(TimeDelta::seconds(-10));
        assert_eq!(clock.now(), before);
    }

    #[test]
    fn manual_clock_saturates_instead_of_wrapping() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance_secs(i64::MAX);
        let end = clock.now();
        assert!(end > start);
        assert_eq!(end.timestamp_millis(), DateTime::<Utc>::MAX_UTC.timestamp_millis());

        clock.advance(TimeDelta::days(1));
        assert_eq!(clock.now(), end);
    }

    #[test]
    fn system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.timestamp() > 1_600_000_000);
    }
}
