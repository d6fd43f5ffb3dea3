//! Tick scheduling and monotonic time helpers.
//!
//! The output loop is anchored to a monotonic start instant. Every tick is
//! computed as `start + n * period` by accumulation, so a late wake-up never
//! pushes later ticks back.

use std::time::{Duration, Instant};

/// Convert a rate in Hz to a tick period.
///
/// Rates that are non-positive, non-finite, or too slow for a `Duration`
/// yield a zero period; callers validate rates before building a schedule.
pub fn period_from_hz(hz: f64) -> Duration {
    if hz.is_finite() && hz > 0.0 {
        Duration::try_from_secs_f64(1.0 / hz).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

/// Signed seconds from `from` to `to` (negative when `to` precedes `from`).
pub fn signed_secs(from: Instant, to: Instant) -> f64 {
    if to >= from {
        (to - from).as_secs_f64()
    } else {
        -(from - to).as_secs_f64()
    }
}

/// Fixed-period tick schedule for the output loop.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    period: Duration,
    next: Instant,
}

impl TickSchedule {
    /// Create a schedule targeting the given Hz rate, anchored at `start`.
    pub fn new(rate_hz: f64, start: Instant) -> Self {
        Self {
            period: period_from_hz(rate_hz),
            next: start,
        }
    }

    /// Advance to the next tick and return its instant.
    pub fn advance(&mut self) -> Instant {
        self.next += self.period;
        self.next
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}
