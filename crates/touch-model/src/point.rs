//! Touch sample type.

use std::time::Instant;

/// A single-contact touch sample.
///
/// `timestamp` is a monotonic instant; coordinates are screen units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub timestamp: Instant,
    pub x: f32,
    pub y: f32,
    pub touching: bool,
}

impl TouchPoint {
    pub fn new(timestamp: Instant, x: f32, y: f32, touching: bool) -> Self {
        Self {
            timestamp,
            x,
            y,
            touching,
        }
    }

    /// A contact at `(x, y)`.
    pub fn touch(timestamp: Instant, x: f32, y: f32) -> Self {
        Self::new(timestamp, x, y, true)
    }

    /// A lift-off at `(x, y)`.
    pub fn release(timestamp: Instant, x: f32, y: f32) -> Self {
        Self::new(timestamp, x, y, false)
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Copy of this point carrying a different timestamp.
    pub fn at(self, timestamp: Instant) -> Self {
        Self { timestamp, ..self }
    }

    /// Copy of this point as a lift-off at the same position.
    pub fn released(self) -> Self {
        Self {
            touching: false,
            ..self
        }
    }

    /// Clamp coordinates into `[0, width-1] x [0, height-1]`.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        Self {
            x: self.x.clamp(0.0, max_x),
            y: self.y.clamp(0.0, max_y),
            ..self
        }
    }
}
