//! Time sources for the acquisition loop.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Monotonic time, wall time and sleeping, as seen by a capture session.
pub trait Clock {
    /// Monotonic time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Local wall-clock time used for file and overlay stamps.
    fn wall_time(&self) -> DateTime<Local>;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real clock: `Instant` for intervals, `chrono::Local` for stamps.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Start a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall_time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn wall_time(&self) -> DateTime<Local> {
        (**self).wall_time()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
