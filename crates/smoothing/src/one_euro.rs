//! 1-Euro filter.
//!
//! Smooth when slow, responsive when fast: the derivative is low-passed at
//! `d_cutoff`, then position is low-passed at
//! `min_cutoff + beta * |derivative|`.

use std::f64::consts::PI;
use std::time::Instant;

use touchdv_common::clock::signed_secs;
use touchdv_touch_model::TouchPoint;

use crate::SmoothingStrategy;

/// Adaptive low-pass filter over both axes.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    freq: f64,
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
    state: Option<OneEuroState>,
}

#[derive(Debug, Clone, Copy)]
struct OneEuroState {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    last: Instant,
}

impl OneEuroFilter {
    pub fn new(freq: f64, min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            freq: if freq.is_finite() && freq > 0.0 {
                freq
            } else {
                120.0
            },
            min_cutoff,
            beta,
            d_cutoff,
            state: None,
        }
    }

    /// Smoothing factor for a cutoff frequency and sample interval.
    pub fn alpha(cutoff: f64, dt: f64) -> f64 {
        if cutoff <= 0.0 {
            return 0.0;
        }
        let tau = 1.0 / (2.0 * PI * cutoff);
        1.0 / (1.0 + tau / dt)
    }

    fn lowpass(x: f64, prev: f64, alpha: f64) -> f64 {
        alpha * x + (1.0 - alpha) * prev
    }
}

impl SmoothingStrategy for OneEuroFilter {
    fn smooth(&mut self, point: TouchPoint) -> TouchPoint {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(OneEuroState {
                x: point.x as f64,
                y: point.y as f64,
                dx: 0.0,
                dy: 0.0,
                last: point.timestamp,
            });
            return point;
        };

        let mut dt = signed_secs(state.last, point.timestamp);
        if dt <= 0.0 {
            dt = 1.0 / self.freq;
        }
        state.last = point.timestamp;

        let (px, py) = (point.x as f64, point.y as f64);
        let a_d = Self::alpha(self.d_cutoff, dt);
        state.dx = Self::lowpass((px - state.x) / dt, state.dx, a_d);
        state.dy = Self::lowpass((py - state.y) / dt, state.dy, a_d);

        let cutoff_x = self.min_cutoff + self.beta * state.dx.abs();
        let cutoff_y = self.min_cutoff + self.beta * state.dy.abs();
        state.x = Self::lowpass(px, state.x, Self::alpha(cutoff_x, dt));
        state.y = Self::lowpass(py, state.y, Self::alpha(cutoff_y, dt));

        TouchPoint {
            x: state.x as f32,
            y: state.y as f32,
            ..point
        }
    }

    fn reset(&mut self) {
        self.state = None;
    }
}
