//! The fixed-interval tick that drives device polling.
//!
//! A [Ticker] doesn't own a thread or an event loop. Whoever drives the
//! session asks it whether a tick is due: the terminal UI between key events,
//! the monitor by sleeping until the next one, tests by handing it made-up
//! instants.

use std::time::{Duration, Instant};

/// Default interval between two device polls.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Says when the next tick is due.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    /// A ticker whose first tick is one `interval` after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next: now + interval,
        }
    }

    #[allow(missing_docs)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long until the next tick; zero if it is due or overdue.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Returns `true`, and schedules the following tick, if a tick is due.
    ///
    /// Ticks missed because the driver was busy are not made up; the next
    /// one is a whole interval after `now`.
    pub fn take_tick(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = if now - self.next >= self.interval {
            now + self.interval
        } else {
            self.next + self.interval
        };
        true
    }

    /// Sleeps until the next tick is due, then takes it.
    pub fn wait(&mut self) {
        spin_sleep::sleep(self.time_until_due(Instant::now()));
        // spin_sleep can come back a hair early
        while !self.take_tick(Instant::now()) {
            std::hint::spin_loop();
        }
    }
}
