//! Per-tick resampling state machine.
//!
//! [`Resampler`] holds everything the sender thread owns: input history,
//! smoothing state, and the active-touch bookkeeping used for timeout
//! release. Each call to [`Resampler::tick`] processes at most one drained
//! input sample and yields at most one output point for the tick instant.
//! It does no I/O and never sleeps, so it can be driven with synthetic
//! instants.

use std::time::{Duration, Instant};

use touchdv_smoothing::{Smoother, SmoothingStrategy};
use touchdv_touch_model::{clamp_transition_threshold, ResamplerConfig, TouchPoint};

use crate::history::{Bracket, History};
use crate::interpolate::interpolate;

/// Resampling state for one engine run.
#[derive(Debug, Clone)]
pub struct Resampler {
    width: u32,
    height: u32,
    timeout: Option<Duration>,
    threshold: f64,
    history: History,
    smoother: Smoother,
    active_touch: bool,
    last_input: Option<Instant>,
    last_emitted: Option<Instant>,
}

impl Resampler {
    /// Build from a configuration, with the configured smoothing filter.
    pub fn new(config: &ResamplerConfig) -> Self {
        let timeout = Duration::try_from_secs_f64(config.touch_timeout_ms / 1000.0)
            .ok()
            .filter(|timeout| !timeout.is_zero());

        Self {
            width: config.screen_width,
            height: config.screen_height,
            timeout,
            threshold: clamp_transition_threshold(config.touch_transition_threshold),
            history: History::new(config),
            smoother: Smoother::new(config.smoothing, &config.smoothing_params),
            active_touch: false,
            last_input: None,
            last_emitted: None,
        }
    }

    /// Replace the smoothing filter. The new filter starts fresh.
    pub fn set_smoother(&mut self, smoother: Smoother) {
        self.smoother = smoother;
    }

    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    /// Set the touch transition threshold, clamped to `[0, 0.5]`.
    pub fn set_transition_threshold(&mut self, threshold: f64) {
        self.threshold = clamp_transition_threshold(threshold);
    }

    pub fn transition_threshold(&self) -> f64 {
        self.threshold
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether a contact is currently down.
    pub fn has_active_touch(&self) -> bool {
        self.active_touch
    }

    /// Timestamp of the last emitted point.
    pub fn last_emitted(&self) -> Option<Instant> {
        self.last_emitted
    }

    /// Run one output tick at `target`, consuming `input` if one was drained.
    pub fn tick(&mut self, target: Instant, input: Option<TouchPoint>) -> Option<TouchPoint> {
        if let Some(point) = input {
            if let Some(release) = self.admit(point, target) {
                return Some(self.record(release));
            }
        }

        if let Some(release) = self.check_timeout(target) {
            return Some(self.record(release));
        }

        let resampled = match self.history.bracket(target)? {
            Bracket::Between(a, b) => interpolate(&a, &b, target, self.threshold),
            Bracket::Hold(p) => p.at(target),
            Bracket::Extrapolated(p) => p,
        };

        let smoothed = self.smoother.smooth(resampled);
        Some(self.record(smoothed.clamped(self.width, self.height)))
    }

    /// Final release when the engine stops mid-touch, stamped no earlier
    /// than the last emitted point.
    pub fn finish(&mut self, now: Instant) -> Option<TouchPoint> {
        if !self.active_touch {
            return None;
        }
        let last = *self.history.last()?;
        let stamp = self.last_emitted.map_or(now, |prev| prev.max(now));
        let release = last.released().at(stamp).clamped(self.width, self.height);
        self.flush();
        Some(self.record(release))
    }

    /// Admit a drained sample. An explicit lift-off is returned for
    /// immediate emission.
    ///
    /// A lift-off with no contact down is dropped: the gesture already
    /// ended with its one release.
    fn admit(&mut self, point: TouchPoint, target: Instant) -> Option<TouchPoint> {
        if !point.touching && !self.active_touch {
            tracing::trace!(x = point.x, y = point.y, "Ignoring release without active touch");
            return None;
        }

        let Some(stored) = self.history.admit(point) else {
            tracing::debug!(
                x = point.x,
                y = point.y,
                "Dropping out-of-order touch sample"
            );
            return None;
        };

        self.last_input = Some(stored.timestamp);
        self.active_touch = stored.touching;
        if stored.touching {
            return None;
        }

        tracing::trace!(x = stored.x, y = stored.y, "Explicit release");
        self.flush();
        Some(stored.at(target).clamped(self.width, self.height))
    }

    fn check_timeout(&mut self, target: Instant) -> Option<TouchPoint> {
        let timeout = self.timeout?;
        let last_input = self.last_input?;
        if !self.active_touch || target.saturating_duration_since(last_input) <= timeout {
            return None;
        }

        let last = *self.history.last()?;
        tracing::debug!(
            x = last.x,
            y = last.y,
            timeout_ms = timeout.as_millis() as u64,
            "No input within timeout, releasing touch"
        );
        self.flush();
        Some(last.released().at(target).clamped(self.width, self.height))
    }

    fn flush(&mut self) {
        self.history.clear();
        self.smoother.reset();
        self.active_touch = false;
    }

    fn record(&mut self, point: TouchPoint) -> TouchPoint {
        self.last_emitted = Some(point.timestamp);
        point
    }
}
