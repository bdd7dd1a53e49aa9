//! Wall-clock timestamps with one-second precision.

use chrono::{Local, NaiveDateTime, Timelike};

/// The format used for every timestamp written to an output file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A source of "now". The [SessionController](crate::session::SessionController)
/// stamps every row through one of these, so tests can pin the time.
pub trait Clock {
    /// The current local time, truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;
}

/// The local system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        truncate_to_seconds(Local::now().naive_local())
    }
}

/// Drops any sub-second component.
pub fn truncate_to_seconds(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Renders a timestamp the way it appears in output files.
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
