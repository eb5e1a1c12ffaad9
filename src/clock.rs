use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for the gates.
///
/// The time-window gate compares against the local time of day, so every
/// reading carries its UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

// Local wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

// Clock that only moves when told to (tests, replays)
pub struct ManualClock {
    micros: AtomicI64, // since unix epoch, UTC
}

impl ManualClock {
    pub fn at(time: DateTime<FixedOffset>) -> Self {
        Self {
            micros: AtomicI64::new(time.timestamp_micros()),
        }
    }

    // Pin to the given time of day on 1970-01-01 UTC
    pub fn at_time_of_day(time: NaiveTime) -> Self {
        let day = DateTime::<Utc>::default().date_naive();
        Self::at(day.and_time(time).and_utc().fixed_offset())
    }

    pub fn set(&self, time: DateTime<FixedOffset>) {
        self.micros.store(time.timestamp_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: TimeDelta) {
        let step = by.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(step, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp_micros(self.micros.load(Ordering::SeqCst))
            .unwrap_or_default()
            .fixed_offset()
    }
}
