//! Time source and date-window helpers
//!
//! Batch procedures never read the wall clock directly. They take a `Clock`
//! so date windows are deterministic under test.

use chrono::{Days, NaiveDateTime};

/// Source of "now" for date-window computation
pub trait Clock: Send + Sync {
    /// Current local date/time, no timezone attached
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time source used by production batch runs
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Fixed time source for tests
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Format a datetime the way the upstream `gte_date` parameter expects:
/// `yyyy-MM-ddTHH:mm:ss`, no timezone suffix.
pub fn format_gte_date(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Datetime `days` calendar days before the clock's current time
pub fn days_ago(clock: &dyn Clock, days: u64) -> NaiveDateTime {
    clock
        .now()
        .checked_sub_days(Days::new(days))
        .unwrap_or_else(|| clock.now())
}

/// Date-only cutoff string (`yyyy-MM-dd`) `days` calendar days back
pub fn date_cutoff(clock: &dyn Clock, days: u64) -> String {
    days_ago(clock, days).format("%Y-%m-%d").to_string()
}

/// Inclusive lower-bound comparison of a release date against a cutoff date.
///
/// Release dates arrive as `yyyy-MM-dd` or `yyyy-MM-dd HH:mm:ss`; only the
/// date portion participates in the comparison.
pub fn released_on_or_after(release_date: &str, cutoff: &str) -> bool {
    release_date.get(0..10).unwrap_or(release_date) >= cutoff
}
