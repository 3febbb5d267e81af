//! Wall-Clock Timing
//!
//! Monotonic timing around a whole batch of repeats. The runner reports the
//! average in whole milliseconds, truncated.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// Timer for measuring a batch of invocations
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since [`Timer::start`]
    #[inline(always)]
    pub fn stop(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Average duration per repeat in whole milliseconds, rounded down
pub fn average_millis(total: Duration, repeats: NonZeroU32) -> u64 {
    let avg = total.as_millis() / u128::from(repeats.get());
    u64::try_from(avg).unwrap_or(u64::MAX)
}
