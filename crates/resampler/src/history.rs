//! Time-ordered input history with bracketing and extrapolation.
//!
//! Owned exclusively by the sender thread. Timestamps are non-decreasing;
//! a sample arriving slightly late is pulled forward to the tail, a sample
//! arriving more than [`MAX_LATENESS`] late is rejected.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use touchdv_common::clock::signed_secs;
use touchdv_touch_model::{ResamplerConfig, TouchPoint};

/// How far behind the tail a sample may be and still be admitted.
pub const MAX_LATENESS: Duration = Duration::from_millis(100);

/// Above this many entries, bracketing switches to binary search.
const LINEAR_SCAN_MAX: usize = 10;

/// Point-pairs considered for velocity and confidence.
const RECENT_PAIRS: usize = 3;

/// Minimum confidence for trusting an extrapolated point.
const MIN_CONFIDENCE: f64 = 0.5;

/// Extrapolated points further than this outside the screen are discarded.
const EXTRAPOLATION_MARGIN: f64 = 100.0;

/// Pair intervals at or below this are ignored when estimating velocity.
const MIN_PAIR_SECS: f64 = 1e-6;

/// What the history yields for a tick target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket {
    /// No usable pair; hold this point.
    Hold(TouchPoint),
    /// Target falls between these two adjacent samples.
    Between(TouchPoint, TouchPoint),
    /// Target is past the tail and motion was projected forward.
    Extrapolated(TouchPoint),
}

/// Bounded input history.
#[derive(Debug, Clone)]
pub struct History {
    points: VecDeque<TouchPoint>,
    window: Duration,
    max_extrapolation: Duration,
    width: f64,
    height: f64,
}

impl History {
    pub fn new(config: &ResamplerConfig) -> Self {
        Self {
            points: VecDeque::with_capacity(config.history_capacity()),
            window: secs_to_duration(config.max_input_history_secs),
            max_extrapolation: secs_to_duration(config.max_extrapolation_ms / 1000.0),
            width: f64::from(config.screen_width),
            height: f64::from(config.screen_height),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TouchPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&TouchPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TouchPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append `point` if its timestamp is acceptable, then evict entries
    /// that fell out of the retention window.
    ///
    /// Returns the point as stored (a late point carries the tail's
    /// timestamp), or `None` if it was rejected.
    pub fn admit(&mut self, point: TouchPoint) -> Option<TouchPoint> {
        let point = match self.points.back() {
            Some(tail) if point.timestamp < tail.timestamp => {
                if tail.timestamp - point.timestamp > MAX_LATENESS {
                    return None;
                }
                point.at(tail.timestamp)
            }
            _ => point,
        };

        self.points.push_back(point);
        self.evict(point.timestamp);
        Some(point)
    }

    fn evict(&mut self, newest: Instant) {
        let Some(cutoff) = newest.checked_sub(self.window) else {
            return;
        };
        while self.points.len() > 1 {
            match self.points.front() {
                Some(front) if front.timestamp < cutoff => {
                    self.points.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Locate the samples around `target`.
    pub fn bracket(&self, target: Instant) -> Option<Bracket> {
        let first = *self.points.front()?;
        let last = *self.points.back()?;

        if target >= last.timestamp {
            return Some(self.extrapolate(last, target));
        }
        if target <= first.timestamp {
            return Some(Bracket::Hold(first));
        }

        let idx = self.first_at_or_after(target);
        let before = idx.checked_sub(1).and_then(|i| self.points.get(i));
        match (before, self.points.get(idx)) {
            (Some(a), Some(b)) => Some(Bracket::Between(*a, *b)),
            _ => Some(Bracket::Hold(last)),
        }
    }

    /// Index of the first sample with `timestamp >= target`.
    fn first_at_or_after(&self, target: Instant) -> usize {
        if self.points.len() > LINEAR_SCAN_MAX {
            self.points.partition_point(|p| p.timestamp < target)
        } else {
            self.points
                .iter()
                .position(|p| p.timestamp >= target)
                .unwrap_or(self.points.len())
        }
    }

    fn extrapolate(&self, last: TouchPoint, target: Instant) -> Bracket {
        let delta = target.saturating_duration_since(last.timestamp);
        if delta > self.max_extrapolation || self.points.len() < 2 {
            return Bracket::Hold(last);
        }
        if self.confidence() <= MIN_CONFIDENCE {
            return Bracket::Hold(last);
        }
        let Some((vx, vy)) = self.velocity() else {
            return Bracket::Hold(last);
        };

        let dt = delta.as_secs_f64();
        let x = f64::from(last.x) + vx * dt;
        let y = f64::from(last.y) + vy * dt;
        let in_bounds = (-EXTRAPOLATION_MARGIN..=self.width + EXTRAPOLATION_MARGIN).contains(&x)
            && (-EXTRAPOLATION_MARGIN..=self.height + EXTRAPOLATION_MARGIN).contains(&y);
        if !in_bounds {
            return Bracket::Hold(last);
        }

        Bracket::Extrapolated(TouchPoint::new(target, x as f32, y as f32, last.touching))
    }

    /// Most recent adjacent pairs, newest first, as `(older, newer, dt)`.
    fn recent_pairs(&self) -> impl Iterator<Item = (TouchPoint, TouchPoint, f64)> + '_ {
        let n = self.points.len();
        (0..RECENT_PAIRS.min(n.saturating_sub(1))).filter_map(move |i| {
            let newer = self.points[n - 1 - i];
            let older = self.points[n - 2 - i];
            let dt = signed_secs(older.timestamp, newer.timestamp);
            (dt > MIN_PAIR_SECS).then_some((older, newer, dt))
        })
    }

    /// Recency-weighted velocity in units per second.
    pub fn velocity(&self) -> Option<(f64, f64)> {
        let mut total = 0.0;
        let (mut vx, mut vy) = (0.0, 0.0);
        for (i, (older, newer, dt)) in self.recent_pairs().enumerate() {
            let weight = 1.0 / (1.0 + i as f64);
            vx += weight * f64::from(newer.x - older.x) / dt;
            vy += weight * f64::from(newer.y - older.y) / dt;
            total += weight;
        }
        (total > 0.0).then(|| (vx / total, vy / total))
    }

    /// `exp(-cv)` of recent pair speeds: 1.0 for a static contact, towards
    /// 0 for erratic motion, 0 with no usable pair.
    pub fn confidence(&self) -> f64 {
        let speeds: Vec<f64> = self
            .recent_pairs()
            .map(|(older, newer, dt)| {
                let dx = f64::from(newer.x - older.x);
                let dy = f64::from(newer.y - older.y);
                dx.hypot(dy) / dt
            })
            .collect();
        if speeds.is_empty() {
            return 0.0;
        }

        let n = speeds.len() as f64;
        let mean = speeds.iter().sum::<f64>() / n;
        if mean < 1e-6 {
            return 1.0;
        }
        let variance = speeds.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        (-(variance.sqrt() / mean)).exp()
    }
}

/// Non-positive or NaN spans are zero; spans too large for a `Duration`
/// saturate.
fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
