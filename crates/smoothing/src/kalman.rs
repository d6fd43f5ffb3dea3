//! Constant-velocity Kalman smoothing.
//!
//! Each axis keeps a position, a velocity, and a scalar position variance.
//! The gain is the scalar `p / (p + r)` rather than a full covariance
//! update, and velocity accumulates from the scaled innovation.

use std::time::Instant;

use touchdv_common::clock::signed_secs;
use touchdv_touch_model::TouchPoint;

use crate::SmoothingStrategy;

/// Step used before a second sample gives a real interval.
const DEFAULT_DT: f64 = 1.0 / 120.0;

#[derive(Debug, Clone, Copy, Default)]
struct Axis {
    pos: f64,
    vel: f64,
    var: f64,
}

impl Axis {
    fn seed(pos: f64) -> Self {
        Self {
            pos,
            vel: 0.0,
            var: 0.0,
        }
    }

    fn step(&mut self, measured: f64, dt: f64, q: f64, r: f64) -> f64 {
        // Predict.
        self.pos += self.vel * dt;
        self.var += q;

        // Update.
        let innovation = measured - self.pos;
        let s = self.var + r;
        let gain = if s > 0.0 { self.var / s } else { 1.0 };

        self.pos += gain * innovation;
        self.vel += gain * innovation / dt;
        self.var *= 1.0 - gain;
        self.pos
    }
}

/// Kalman filter with process noise `q` and measurement noise `r`.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    q: f64,
    r: f64,
    state: Option<KalmanState>,
}

#[derive(Debug, Clone, Copy)]
struct KalmanState {
    x: Axis,
    y: Axis,
    last: Instant,
}

impl KalmanFilter {
    pub fn new(q: f64, r: f64) -> Self {
        Self {
            q: q.max(0.0),
            r: r.max(0.0),
            state: None,
        }
    }
}

impl SmoothingStrategy for KalmanFilter {
    fn smooth(&mut self, point: TouchPoint) -> TouchPoint {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(KalmanState {
                x: Axis::seed(point.x as f64),
                y: Axis::seed(point.y as f64),
                last: point.timestamp,
            });
            return point;
        };

        let mut dt = signed_secs(state.last, point.timestamp);
        if dt <= 0.0 {
            dt = DEFAULT_DT;
        }
        state.last = point.timestamp;

        let x = state.x.step(point.x as f64, dt, self.q, self.r);
        let y = state.y.step(point.y as f64, dt, self.q, self.r);

        TouchPoint {
            x: x as f32,
            y: y as f32,
            ..point
        }
    }

    fn reset(&mut self) {
        self.state = None;
    }
}
