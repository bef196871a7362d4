/// Clock abstraction for window evaluation
///
/// The gate never reads the system clock directly; it goes through this
/// trait so tests can pin the current time. The system implementation
/// applies the configured fixed offset, so callers always see wall-clock
/// time already normalized to the service timezone.
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Source of the current time in the service's fixed timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Production clock: system time shifted to the configured offset
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Create a clock for the given offset from UTC, in minutes.
    /// Out-of-range offsets fall back to UTC; config validation rejects
    /// them before this point.
    pub fn new(offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Test clock pinned to a settable instant
#[cfg(test)]
pub struct FixedClock(std::sync::Mutex<DateTime<FixedOffset>>);

#[cfg(test)]
impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self(std::sync::Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        let mut guard = self.0.lock().unwrap();
        *guard += chrono::Duration::minutes(minutes);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_applies_offset() {
        let clock = SystemClock::new(330);
        let now = clock.now();
        assert_eq!(now.offset().local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_system_clock_rejects_absurd_offset() {
        // Falls back to UTC rather than panicking
        let clock = SystemClock::new(100_000);
        assert_eq!(clock.now().offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_fixed_clock_advances() {
        let offset = FixedOffset::east_opt(330 * 60).unwrap();
        let start = DateTime::parse_from_rfc3339("2024-06-03T13:00:00+05:30").unwrap();
        let clock = FixedClock::new(start.with_timezone(&offset));
        clock.advance_minutes(90);
        assert_eq!(clock.now().time(), chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }
}
