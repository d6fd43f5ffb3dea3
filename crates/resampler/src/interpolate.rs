//! Linear interpolation between two samples and touch-state reconstruction.

use std::time::Instant;

use touchdv_common::clock::signed_secs;
use touchdv_touch_model::TouchPoint;

/// Brackets shorter than this are treated as a single instant.
const MIN_SPAN_SECS: f64 = 1e-6;

/// Fraction of the way from `a` to `b` at `t`, clamped to `[0, 1]`.
pub fn fraction(a: &TouchPoint, b: &TouchPoint, t: Instant) -> f64 {
    let span = signed_secs(a.timestamp, b.timestamp);
    if span <= MIN_SPAN_SECS {
        return 0.0;
    }
    (signed_secs(a.timestamp, t) / span).clamp(0.0, 1.0)
}

/// Touch state at fraction `u` between two samples.
///
/// A lift-off is delayed until `u >= 1 - threshold`; a touch-down is taken
/// as soon as `u >= threshold`. Equal states pass through.
pub fn reconstruct_touch(from: bool, to: bool, u: f64, threshold: f64) -> bool {
    match (from, to) {
        (true, false) => u < 1.0 - threshold,
        (false, true) => u >= threshold,
        (same, _) => same,
    }
}

/// Point at `t` on the segment from `a` to `b`, stamped `t`.
pub fn interpolate(a: &TouchPoint, b: &TouchPoint, t: Instant, threshold: f64) -> TouchPoint {
    let u = fraction(a, b, t);
    let lerp = |from: f32, to: f32| {
        let (from, to) = (f64::from(from), f64::from(to));
        (from + (to - from) * u) as f32
    };

    TouchPoint {
        timestamp: t,
        x: lerp(a.x, b.x),
        y: lerp(a.y, b.y),
        touching: reconstruct_touch(a.touching, b.touching, u, threshold),
    }
}
