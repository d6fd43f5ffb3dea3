//! Exponential moving average.

use touchdv_touch_model::TouchPoint;

use crate::{clamp01, SmoothingStrategy};

/// `out = alpha * in + (1 - alpha) * prev`; the first sample seeds `prev`.
#[derive(Debug, Clone)]
pub struct EmaFilter {
    alpha: f64,
    prev: Option<(f64, f64)>,
}

impl EmaFilter {
    /// `alpha` is the weight of the newest sample, clamped to `[0, 1]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: clamp01(alpha),
            prev: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl SmoothingStrategy for EmaFilter {
    fn smooth(&mut self, point: TouchPoint) -> TouchPoint {
        let (x, y) = match self.prev {
            None => (point.x as f64, point.y as f64),
            Some((prev_x, prev_y)) => (
                self.alpha * point.x as f64 + (1.0 - self.alpha) * prev_x,
                self.alpha * point.y as f64 + (1.0 - self.alpha) * prev_y,
            ),
        };
        self.prev = Some((x, y));

        TouchPoint {
            x: x as f32,
            y: y as f32,
            ..point
        }
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_ema_blends_toward_new_sample() {
        let now = Instant::now();
        let mut filter = EmaFilter::new(0.5);
        let first = filter.smooth(TouchPoint::touch(now, 0.0, 0.0));
        assert_eq!((first.x, first.y), (0.0, 0.0));

        let second = filter.smooth(TouchPoint::touch(now, 10.0, 20.0));
        assert!((second.x - 5.0).abs() < 1e-6);
        assert!((second.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_ema_reduces_jitter() {
        let now = Instant::now();
        let mut filter = EmaFilter::new(0.3);
        let raw = [500.0, 530.0, 470.0, 525.0, 480.0, 515.0, 490.0];
        let mut smoothed = Vec::new();
        for (i, &x) in raw.iter().enumerate() {
            let p = TouchPoint::touch(now + Duration::from_millis(i as u64 * 8), x, 500.0);
            smoothed.push(filter.smooth(p).x);
        }
        for &x in &smoothed[2..] {
            assert!((x - 500.0).abs() < 20.0, "smoothed x={x} too far from center");
        }
    }

    #[test]
    fn test_alpha_is_clamped() {
        assert_eq!(EmaFilter::new(1.7).alpha(), 1.0);
        assert_eq!(EmaFilter::new(-0.2).alpha(), 0.0);
    }

    proptest! {
        #[test]
        fn ema_with_unit_alpha_is_identity(
            coords in proptest::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0), 1..64)
        ) {
            let start = Instant::now();
            let mut filter = EmaFilter::new(1.0);
            for (i, (x, y)) in coords.into_iter().enumerate() {
                let p = TouchPoint::touch(start + Duration::from_millis(i as u64), x, y);
                let out = filter.smooth(p);
                prop_assert_eq!(out, p);
            }
        }
    }
}
